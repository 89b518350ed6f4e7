//! SQLite-backed concert store.

use super::models::*;
use super::schema::CONCERT_VERSIONED_SCHEMAS;
use super::trait_def::ConcertStore;
use crate::sqlite_persistence::open_versioned;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const NAME_FILTER_CLAUSE: &str = "(?1 IS NULL OR instr(lower(name), lower(?1)) > 0)";

#[derive(Clone)]
pub struct SqliteConcertStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConcertStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).with_context(|| {
            format!(
                "Failed to open concerts database at {}",
                db_path.as_ref().display()
            )
        })?;
        open_versioned(&conn, CONCERT_VERSIONED_SCHEMAS, "concerts")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = SqliteConcertStore {
            conn: Arc::new(Mutex::new(conn)),
        };
        let stats = store.get_stats()?;
        info!(
            "Opened concerts db: {} artists, {} venues, {} shows, {} notes",
            stats.artists, stats.venues, stats.shows, stats.notes
        );
        Ok(store)
    }

    fn parse_artist_row(row: &Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn parse_venue_row(row: &Row) -> rusqlite::Result<Venue> {
        Ok(Venue {
            id: row.get(0)?,
            name: row.get(1)?,
            city: row.get(2)?,
            state: row.get(3)?,
        })
    }

    fn parse_show_row(row: &Row) -> rusqlite::Result<Show> {
        Ok(Show {
            id: row.get(0)?,
            artist_id: row.get(1)?,
            venue_id: row.get(2)?,
            show_date: row.get(3)?,
        })
    }

    fn parse_note_row(row: &Row) -> rusqlite::Result<Note> {
        Ok(Note {
            id: row.get(0)?,
            user_id: row.get::<_, i64>(1)? as usize,
            show_id: row.get(2)?,
            title: row.get(3)?,
            text: row.get(4)?,
            photo: row.get(5)?,
            posted_date: row.get(6)?,
        })
    }

    fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
        let count: i64 = conn.query_row(sql, params, |r| r.get(0))?;
        Ok(count as usize)
    }

    fn note_filter_clause(filter: NoteFilter) -> (&'static str, Option<i64>) {
        match filter {
            NoteFilter::All => ("?1 IS NULL", None),
            NoteFilter::Show(show_id) => ("show_id = ?1", Some(show_id)),
            NoteFilter::User(user_id) => ("user_id = ?1", Some(user_id as i64)),
        }
    }

    fn show_filter_clause(filter: ShowFilter) -> (&'static str, i64) {
        match filter {
            ShowFilter::Artist(artist_id) => ("artist_id = ?1", artist_id),
            ShowFilter::Venue(venue_id) => ("venue_id = ?1", venue_id),
        }
    }
}

impl ConcertStore for SqliteConcertStore {
    // =========================================================================
    // Artists
    // =========================================================================

    fn create_artist(&self, name: &str) -> Result<Artist> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO artist (name) VALUES (?1)", params![name])
            .with_context(|| format!("Failed to create artist {}", name))?;
        Ok(Artist {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn get_artist(&self, id: ArtistId) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM artist WHERE id = ?1")?;
        Ok(stmt
            .query_row(params![id], Self::parse_artist_row)
            .optional()?)
    }

    fn count_artists(&self, name_filter: Option<&str>) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM artist WHERE {}", NAME_FILTER_CLAUSE),
            params![name_filter],
        )
    }

    fn list_artists(&self, name_filter: Option<&str>, window: Window) -> Result<Vec<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT id, name FROM artist WHERE {}
             ORDER BY name COLLATE NOCASE, id LIMIT ?2 OFFSET ?3",
            NAME_FILTER_CLAUSE
        ))?;
        let artists = stmt
            .query_map(
                params![name_filter, window.sql_limit(), window.offset as i64],
                Self::parse_artist_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn update_artist(&self, artist: &Artist) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE artist SET name = ?1 WHERE id = ?2",
            params![&artist.name, artist.id],
        )?;
        Ok(updated > 0)
    }

    fn delete_artist(&self, id: ArtistId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM artist WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // =========================================================================
    // Venues
    // =========================================================================

    fn create_venue(&self, name: &str, city: &str, state: &str) -> Result<Venue> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO venue (name, city, state) VALUES (?1, ?2, ?3)",
            params![name, city, state],
        )
        .with_context(|| format!("Failed to create venue {}", name))?;
        Ok(Venue {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        })
    }

    fn get_venue(&self, id: VenueId) -> Result<Option<Venue>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached("SELECT id, name, city, state FROM venue WHERE id = ?1")?;
        Ok(stmt
            .query_row(params![id], Self::parse_venue_row)
            .optional()?)
    }

    fn count_venues(&self, name_filter: Option<&str>) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM venue WHERE {}", NAME_FILTER_CLAUSE),
            params![name_filter],
        )
    }

    fn list_venues(&self, name_filter: Option<&str>, window: Window) -> Result<Vec<Venue>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT id, name, city, state FROM venue WHERE {}
             ORDER BY name COLLATE NOCASE, id LIMIT ?2 OFFSET ?3",
            NAME_FILTER_CLAUSE
        ))?;
        let venues = stmt
            .query_map(
                params![name_filter, window.sql_limit(), window.offset as i64],
                Self::parse_venue_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(venues)
    }

    fn update_venue(&self, venue: &Venue) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE venue SET name = ?1, city = ?2, state = ?3 WHERE id = ?4",
            params![&venue.name, &venue.city, &venue.state, venue.id],
        )?;
        Ok(updated > 0)
    }

    fn delete_venue(&self, id: VenueId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM venue WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // =========================================================================
    // Shows
    // =========================================================================

    fn create_show(&self, artist_id: ArtistId, venue_id: VenueId, show_date: i64) -> Result<Show> {
        let conn = self.conn.lock().unwrap();
        let artist_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM artist WHERE id = ?1)",
            params![artist_id],
            |r| r.get(0),
        )?;
        if !artist_exists {
            bail!("Artist with id {} not found", artist_id);
        }
        let venue_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM venue WHERE id = ?1)",
            params![venue_id],
            |r| r.get(0),
        )?;
        if !venue_exists {
            bail!("Venue with id {} not found", venue_id);
        }

        conn.execute(
            "INSERT INTO show (artist_id, venue_id, show_date) VALUES (?1, ?2, ?3)",
            params![artist_id, venue_id, show_date],
        )?;
        Ok(Show {
            id: conn.last_insert_rowid(),
            artist_id,
            venue_id,
            show_date,
        })
    }

    fn get_show(&self, id: ShowId) -> Result<Option<Show>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached("SELECT id, artist_id, venue_id, show_date FROM show WHERE id = ?1")?;
        Ok(stmt.query_row(params![id], Self::parse_show_row).optional()?)
    }

    fn count_shows(&self, filter: ShowFilter) -> Result<usize> {
        let (clause, value) = Self::show_filter_clause(filter);
        let conn = self.conn.lock().unwrap();
        Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM show WHERE {}", clause),
            params![value],
        )
    }

    fn list_shows(&self, filter: ShowFilter, window: Window) -> Result<Vec<Show>> {
        let (clause, value) = Self::show_filter_clause(filter);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT id, artist_id, venue_id, show_date FROM show WHERE {}
             ORDER BY show_date DESC, id DESC LIMIT ?2 OFFSET ?3",
            clause
        ))?;
        let shows = stmt
            .query_map(
                params![value, window.sql_limit(), window.offset as i64],
                Self::parse_show_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(shows)
    }

    fn update_show(&self, show: &Show) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE show SET artist_id = ?1, venue_id = ?2, show_date = ?3 WHERE id = ?4",
            params![show.artist_id, show.venue_id, show.show_date, show.id],
        )?;
        Ok(updated > 0)
    }

    fn delete_show(&self, id: ShowId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM show WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // =========================================================================
    // Notes
    // =========================================================================

    fn create_note(&self, note: &NewNoteRecord) -> Result<Note> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO note (user_id, show_id, title, text, photo, posted_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.user_id as i64,
                note.show_id,
                &note.title,
                &note.text,
                &note.photo,
                note.posted_date
            ],
        )
        .with_context(|| format!("Failed to create note for show {}", note.show_id))?;
        Ok(Note {
            id: conn.last_insert_rowid(),
            user_id: note.user_id,
            show_id: note.show_id,
            title: note.title.clone(),
            text: note.text.clone(),
            photo: note.photo.clone(),
            posted_date: note.posted_date,
        })
    }

    fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, show_id, title, text, photo, posted_date FROM note WHERE id = ?1",
        )?;
        Ok(stmt.query_row(params![id], Self::parse_note_row).optional()?)
    }

    fn count_notes(&self, filter: NoteFilter) -> Result<usize> {
        let (clause, value) = Self::note_filter_clause(filter);
        let conn = self.conn.lock().unwrap();
        Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM note WHERE {}", clause),
            params![value],
        )
    }

    fn list_notes(&self, filter: NoteFilter, window: Window) -> Result<Vec<Note>> {
        let (clause, value) = Self::note_filter_clause(filter);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT id, user_id, show_id, title, text, photo, posted_date FROM note WHERE {}
             ORDER BY posted_date DESC, id ASC LIMIT ?2 OFFSET ?3",
            clause
        ))?;
        let notes = stmt
            .query_map(
                params![value, window.sql_limit(), window.offset as i64],
                Self::parse_note_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn update_note(&self, note: &Note) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE note SET title = ?1, text = ?2, photo = ?3 WHERE id = ?4",
            params![&note.title, &note.text, &note.photo, note.id],
        )?;
        Ok(updated > 0)
    }

    fn delete_note(&self, id: NoteId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM note WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn get_stats(&self) -> Result<ConcertStats> {
        let conn = self.conn.lock().unwrap();
        Ok(ConcertStats {
            artists: Self::count(&conn, "SELECT COUNT(*) FROM artist", [])?,
            venues: Self::count(&conn, "SELECT COUNT(*) FROM venue", [])?,
            shows: Self::count(&conn, "SELECT COUNT(*) FROM show", [])?,
            notes: Self::count(&conn, "SELECT COUNT(*) FROM note", [])?,
        })
    }
}
