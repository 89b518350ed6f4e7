mod file_config;

pub use file_config::{FileConfig, PaginationConfig, PhotosConfig};

use crate::listing::PageSizes;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,

    pub page_sizes: PageSizes,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.clone());

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = match file.logging_level {
            Some(level) => match parse_logging_level(&level) {
                Some(level) => level,
                None => bail!("Unknown logging_level in config file: {}", level),
            },
            None => cli.logging_level.clone(),
        };

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let pagination = file.pagination.unwrap_or_default();
        let defaults = PageSizes::default();
        let page_sizes = PageSizes {
            artists: pagination.artists.unwrap_or(defaults.artists),
            venues: pagination.venues.unwrap_or(defaults.venues),
            shows: pagination.shows.unwrap_or(defaults.shows),
            notes: pagination.notes.unwrap_or(defaults.notes),
        };
        for (name, size) in [
            ("artists", page_sizes.artists),
            ("venues", page_sizes.venues),
            ("shows", page_sizes.shows),
            ("notes", page_sizes.notes),
        ] {
            if size == 0 {
                bail!("Page size for {} must be positive", name);
            }
        }

        let max_upload_bytes = file
            .photos
            .and_then(|photos| photos.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            db_dir,
            media_path,
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
            page_sizes,
            max_upload_bytes,
        })
    }

    pub fn concerts_db_path(&self) -> PathBuf {
        self.db_dir.join("concerts.db")
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            content_cache_age_sec: self.content_cache_age_sec,
            frontend_dir_path: self.frontend_dir_path.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_for(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.path().to_path_buf()),
            media_path: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            content_cache_age_sec: 3600,
            frontend_dir_path: None,
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        // Case insensitive
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_for(&temp_dir), None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.media_path, temp_dir.path());
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.page_sizes, PageSizes::default());
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.concerts_db_path(), temp_dir.path().join("concerts.db"));
        assert_eq!(config.user_db_path(), temp_dir.path().join("user.db"));
    }

    #[test]
    fn test_file_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let file = FileConfig {
            port: Some(8080),
            logging_level: Some("headers".to_string()),
            media_path: Some("/media".to_string()),
            pagination: Some(PaginationConfig {
                notes: Some(20),
                ..Default::default()
            }),
            photos: Some(PhotosConfig {
                max_upload_bytes: Some(1024),
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli_for(&temp_dir), Some(file)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.media_path, PathBuf::from("/media"));
        assert_eq!(config.page_sizes.notes, 20);
        assert_eq!(config.page_sizes.artists, 10);
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.server_config().max_upload_bytes, 1024);
    }

    #[test]
    fn test_missing_db_dir() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result.is_err());

        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/lmn/db")),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_db_dir_must_be_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        std::fs::write(&file_path, "x").unwrap();

        let cli = CliConfig {
            db_dir: Some(file_path),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_rejects_zero_page_size_and_bad_logging_level() {
        let temp_dir = TempDir::new().unwrap();
        let file = FileConfig {
            pagination: Some(PaginationConfig {
                venues: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_for(&temp_dir), Some(file)).is_err());

        let file = FileConfig {
            logging_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_for(&temp_dir), Some(file)).is_err());
    }
}
