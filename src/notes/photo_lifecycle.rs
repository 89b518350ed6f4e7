//! Keeps stored photo blobs in line with note records.
//!
//! Cleanup runs only after the database change it follows has been
//! persisted. Storage failures are logged and swallowed.

use crate::photo_storage::PhotoStorage;
use crate::server::metrics;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoCleanup {
    /// Old and new reference are the same, nothing to do.
    Unchanged,
    /// There was no previous photo.
    NothingToDelete,
    /// The previous blob was already missing from storage.
    AlreadyGone(String),
    Deleted(String),
    /// Storage failed while checking or deleting; the blob may linger.
    Failed(String),
}

impl PhotoCleanup {
    pub fn label(&self) -> &'static str {
        match self {
            PhotoCleanup::Unchanged => "unchanged",
            PhotoCleanup::NothingToDelete => "nothing_to_delete",
            PhotoCleanup::AlreadyGone(_) => "already_gone",
            PhotoCleanup::Deleted(_) => "deleted",
            PhotoCleanup::Failed(_) => "failed",
        }
    }
}

#[derive(Clone)]
pub struct PhotoLifecycle {
    storage: Arc<dyn PhotoStorage>,
}

impl PhotoLifecycle {
    pub fn new(storage: Arc<dyn PhotoStorage>) -> Self {
        Self { storage }
    }

    /// Runs after an edit was persisted, with the reference captured before
    /// the edit and the one now on the record.
    pub fn after_update(&self, previous: Option<&str>, updated: Option<&str>) -> PhotoCleanup {
        self.cleanup(previous, updated)
    }

    /// Runs after a note was deleted.
    pub fn after_delete(&self, photo: Option<&str>) -> PhotoCleanup {
        self.cleanup(photo, None)
    }

    /// Deletes `old` unless it is absent or still referenced as `new`.
    pub fn cleanup(&self, old: Option<&str>, new: Option<&str>) -> PhotoCleanup {
        let outcome = self.run_cleanup(old, new);
        metrics::record_photo_cleanup(outcome.label());
        outcome
    }

    fn run_cleanup(&self, old: Option<&str>, new: Option<&str>) -> PhotoCleanup {
        let Some(old) = old else {
            return PhotoCleanup::NothingToDelete;
        };
        if new == Some(old) {
            return PhotoCleanup::Unchanged;
        }

        match self.storage.exists(old) {
            Ok(false) => {
                debug!("Stale photo {} already gone from storage", old);
                PhotoCleanup::AlreadyGone(old.to_string())
            }
            Ok(true) => match self.storage.delete(old) {
                Ok(()) => {
                    debug!("Deleted stale photo {}", old);
                    PhotoCleanup::Deleted(old.to_string())
                }
                Err(err) => {
                    warn!("Failed to delete stale photo {}: {}", old, err);
                    PhotoCleanup::Failed(old.to_string())
                }
            },
            Err(err) => {
                warn!("Failed to check stale photo {}: {}", old, err);
                PhotoCleanup::Failed(old.to_string())
            }
        }
    }
}
