use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lmn_server::concert_store::{ConcertStore, SqliteConcertStore};
use lmn_server::config::{AppConfig, CliConfig, FileConfig};
use lmn_server::photo_storage::FsPhotoStorage;
use lmn_server::server::{metrics, run_server, RequestsLoggingLevel, ServerState};
use lmn_server::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding concerts.db and user.db, created on first run.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory where uploaded photos are stored. Defaults to the db directory.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of cached photos in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            media_path: self.media_path.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            frontend_dir_path: self.frontend_dir_path.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!(
        "Opening SQLite concerts database at {:?}...",
        app_config.concerts_db_path()
    );
    let concert_store = Arc::new(SqliteConcertStore::new(app_config.concerts_db_path())?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    let stats = concert_store.get_stats()?;
    metrics::init_concert_metrics(stats.artists, stats.venues, stats.shows, stats.notes);

    if !app_config.user_db_path().exists() {
        info!(
            "Creating new user database at {:?}",
            app_config.user_db_path()
        );
    }
    let user_store = Arc::new(SqliteUserStore::new(app_config.user_db_path())?);

    info!("Storing photos under {:?}", app_config.media_path);
    let photo_storage = Arc::new(FsPhotoStorage::new(&app_config.media_path));

    let state = ServerState::new(
        app_config.server_config(),
        concert_store,
        user_store,
        photo_storage,
        app_config.page_sizes.clone(),
    );
    run_server(state, app_config.metrics_port).await
}
