use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use lmn_server::concert_store::{
    Artist, ConcertStore, NoteFilter, Show, ShowFilter, ShowId, SqliteConcertStore, Venue, Window,
};
use lmn_server::notes::PhotoLifecycle;
use lmn_server::photo_storage::FsPhotoStorage;
use lmn_server::user::{NewUser, SqliteUserStore, UserManager};

fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Accepts RFC 3339, "YYYY-MM-DD HH:MM" (UTC) or a bare "YYYY-MM-DD" (UTC midnight).
fn parse_show_date(s: &str) -> Result<i64> {
    let s = s.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(s) {
        return Ok(date_time.timestamp_millis());
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(date_time.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(date_time) = date.and_hms_opt(0, 0, 0) {
            return Ok(date_time.and_utc().timestamp_millis());
        }
    }
    bail!("Could not parse show date {:?}, expected YYYY-MM-DD", s)
}

#[derive(Parser)]
#[command(styles=get_styles(), about = "Seeds and inspects the Live Music Notes databases.")]
struct CliArgs {
    /// Directory holding concerts.db and user.db.
    #[clap(long, value_parser = parse_path)]
    db_dir: PathBuf,

    /// Directory holding uploaded photos. Defaults to the db directory.
    #[clap(long, value_parser = parse_path)]
    media_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Creates a user, optionally with a password.
    AddUser {
        handle: String,
        email: String,
        #[clap(long, default_value = "")]
        first_name: String,
        #[clap(long, default_value = "")]
        last_name: String,
        #[clap(long)]
        password: Option<String>,
    },

    /// Sets or replaces the password of a user.
    SetPassword { handle: String, password: String },

    /// Creates an artist.
    AddArtist { name: String },

    /// Creates a venue.
    AddVenue {
        name: String,
        city: String,
        state: String,
    },

    /// Creates a show of an artist at a venue.
    AddShow {
        artist_id: i64,
        venue_id: i64,
        /// RFC 3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD", in UTC.
        date: String,
    },

    /// Renames an artist.
    RenameArtist { id: i64, name: String },

    /// Replaces the name and location of a venue.
    EditVenue {
        id: i64,
        name: String,
        city: String,
        state: String,
    },

    /// Replaces the artist, venue and date of a show.
    EditShow {
        id: i64,
        artist_id: i64,
        venue_id: i64,
        date: String,
    },

    /// Deletes an artist with its shows, their notes and the notes' photos.
    DeleteArtist { id: i64 },

    /// Deletes a venue with its shows, their notes and the notes' photos.
    DeleteVenue { id: i64 },

    /// Deletes a show with its notes and their photos.
    DeleteShow { id: i64 },

    /// Prints how many rows each table holds.
    Stats,
}

fn open_concerts(db_dir: &std::path::Path) -> Result<SqliteConcertStore> {
    SqliteConcertStore::new(db_dir.join("concerts.db"))
}

fn open_users(db_dir: &std::path::Path) -> Result<UserManager> {
    let store = SqliteUserStore::new(db_dir.join("user.db"))?;
    Ok(UserManager::new(Arc::new(store)))
}

fn show_ids(store: &SqliteConcertStore, filter: ShowFilter) -> Result<Vec<ShowId>> {
    Ok(store
        .list_shows(filter, Window::all())?
        .into_iter()
        .map(|show| show.id)
        .collect())
}

/// Photos attached to notes of the given shows.
fn note_photos(store: &SqliteConcertStore, show_ids: &[ShowId]) -> Result<Vec<String>> {
    let mut photos = Vec::new();
    for show_id in show_ids {
        for note in store.list_notes(NoteFilter::Show(*show_id), Window::all())? {
            photos.extend(note.photo);
        }
    }
    Ok(photos)
}

/// Removes the photos of notes that a cascading delete just took away.
fn remove_photos(media_path: &std::path::Path, photos: &[String]) {
    let photo_lifecycle = PhotoLifecycle::new(Arc::new(FsPhotoStorage::new(media_path)));
    for photo in photos {
        photo_lifecycle.after_delete(Some(photo));
    }
}

fn run(args: CliArgs) -> Result<()> {
    if !args.db_dir.is_dir() {
        bail!("Database directory does not exist: {:?}", args.db_dir);
    }
    let media_path = args.media_path.clone().unwrap_or_else(|| args.db_dir.clone());

    match args.command {
        Command::AddUser {
            handle,
            email,
            first_name,
            last_name,
            password,
        } => {
            let users = open_users(&args.db_dir)?;
            let user_id = users.add_user(NewUser {
                handle: handle.clone(),
                email,
                first_name,
                last_name,
            })?;
            if let Some(password) = password {
                users.create_password_credentials(&handle, &password)?;
            }
            println!("Created user {} with id {}", handle, user_id);
        }
        Command::SetPassword { handle, password } => {
            open_users(&args.db_dir)?.create_password_credentials(&handle, &password)?;
            println!("Password of {} updated", handle);
        }
        Command::AddArtist { name } => {
            let artist = open_concerts(&args.db_dir)?.create_artist(&name)?;
            println!("Created artist {} with id {}", artist.name, artist.id);
        }
        Command::AddVenue { name, city, state } => {
            let venue = open_concerts(&args.db_dir)?.create_venue(&name, &city, &state)?;
            println!("Created venue {} with id {}", venue.name, venue.id);
        }
        Command::AddShow {
            artist_id,
            venue_id,
            date,
        } => {
            let show_date = parse_show_date(&date)?;
            let show = open_concerts(&args.db_dir)?
                .create_show(artist_id, venue_id, show_date)
                .with_context(|| format!("Failed to add show on {}", date))?;
            println!("Created show with id {}", show.id);
        }
        Command::RenameArtist { id, name } => {
            let artist = Artist { id, name };
            if !open_concerts(&args.db_dir)?.update_artist(&artist)? {
                bail!("Artist {} not found", id);
            }
            println!("Renamed artist {} to {}", id, artist.name);
        }
        Command::EditVenue {
            id,
            name,
            city,
            state,
        } => {
            let venue = Venue {
                id,
                name,
                city,
                state,
            };
            if !open_concerts(&args.db_dir)?.update_venue(&venue)? {
                bail!("Venue {} not found", id);
            }
            println!("Updated venue {}", id);
        }
        Command::EditShow {
            id,
            artist_id,
            venue_id,
            date,
        } => {
            let show = Show {
                id,
                artist_id,
                venue_id,
                show_date: parse_show_date(&date)?,
            };
            let updated = open_concerts(&args.db_dir)?
                .update_show(&show)
                .with_context(|| format!("Failed to update show {}", id))?;
            if !updated {
                bail!("Show {} not found", id);
            }
            println!("Updated show {}", id);
        }
        Command::DeleteArtist { id } => {
            let store = open_concerts(&args.db_dir)?;
            let photos = note_photos(&store, &show_ids(&store, ShowFilter::Artist(id))?)?;
            if !store.delete_artist(id)? {
                bail!("Artist {} not found", id);
            }
            remove_photos(&media_path, &photos);
            println!("Deleted artist {} ({} photos removed)", id, photos.len());
        }
        Command::DeleteVenue { id } => {
            let store = open_concerts(&args.db_dir)?;
            let photos = note_photos(&store, &show_ids(&store, ShowFilter::Venue(id))?)?;
            if !store.delete_venue(id)? {
                bail!("Venue {} not found", id);
            }
            remove_photos(&media_path, &photos);
            println!("Deleted venue {} ({} photos removed)", id, photos.len());
        }
        Command::DeleteShow { id } => {
            let store = open_concerts(&args.db_dir)?;
            let photos = note_photos(&store, &[id])?;
            if !store.delete_show(id)? {
                bail!("Show {} not found", id);
            }
            remove_photos(&media_path, &photos);
            println!("Deleted show {} ({} photos removed)", id, photos.len());
        }
        Command::Stats => {
            let stats = open_concerts(&args.db_dir)?.get_stats()?;
            let users = open_users(&args.db_dir)?.get_users_count()?;
            println!(
                "{} artists, {} venues, {} shows, {} notes, {} users",
                stats.artists, stats.venues, stats.shows, stats.notes, users
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    run(CliArgs::parse())
}
