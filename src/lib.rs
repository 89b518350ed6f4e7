//! Live Music Notes server library
//!
//! This library exposes the internal modules for testing and for the admin tool.

pub mod concert_store;
pub mod config;
pub mod listing;
pub mod notes;
pub mod photo_storage;
pub mod server;
pub mod service_error;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use concert_store::{ConcertStore, SqliteConcertStore};
pub use photo_storage::{FsPhotoStorage, PhotoStorage};
pub use server::{run_server, RequestsLoggingLevel};
pub use user::{SqliteUserStore, UserManager, UserStore};
