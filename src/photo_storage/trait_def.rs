use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid photo path: {0}")]
    InvalidPath(String),
}

/// Blob storage for note photos. Paths are opaque strings handed out by
/// `save` and stored on the note record.
#[cfg_attr(test, mockall::automock)]
pub trait PhotoStorage: Send + Sync {
    fn exists(&self, path: &str) -> Result<bool, PhotoStorageError>;

    fn delete(&self, path: &str) -> Result<(), PhotoStorageError>;

    /// Stores `bytes` under a fresh unique path and returns it. `name_hint` is
    /// the client supplied file name, only used to pick an extension.
    fn save(&self, bytes: &[u8], name_hint: &str) -> Result<String, PhotoStorageError>;

    /// Returns `None` if nothing is stored at `path`.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, PhotoStorageError>;
}
