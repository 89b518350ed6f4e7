//! Filesystem photo storage rooted at the media directory.

use super::trait_def::{PhotoStorage, PhotoStorageError};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const PHOTOS_DIR: &str = "photos";

pub struct FsPhotoStorage {
    root: PathBuf,
}

impl FsPhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a stored path to a file under the root, refusing anything that
    /// could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, PhotoStorageError> {
        let relative = Path::new(path);
        let is_safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_safe {
            return Err(PhotoStorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn extension_for(bytes: &[u8], name_hint: &str) -> String {
        if let Some(kind) = infer::get(bytes) {
            return kind.extension().to_string();
        }
        Path::new(name_hint)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "bin".to_string())
    }
}

impl PhotoStorage for FsPhotoStorage {
    fn exists(&self, path: &str) -> Result<bool, PhotoStorageError> {
        Ok(self.resolve(path)?.is_file())
    }

    fn delete(&self, path: &str) -> Result<(), PhotoStorageError> {
        let file_path = self.resolve(path)?;
        std::fs::remove_file(&file_path)?;
        debug!("Deleted photo {}", file_path.display());
        Ok(())
    }

    fn save(&self, bytes: &[u8], name_hint: &str) -> Result<String, PhotoStorageError> {
        let dir = self.root.join(PHOTOS_DIR);
        std::fs::create_dir_all(&dir)?;

        let file_name = format!(
            "{}.{}",
            uuid::Uuid::new_v4(),
            Self::extension_for(bytes, name_hint)
        );
        std::fs::write(dir.join(&file_name), bytes)?;
        let path = format!("{}/{}", PHOTOS_DIR, file_name);
        debug!("Saved photo {} ({} bytes)", path, bytes.len());
        Ok(path)
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, PhotoStorageError> {
        let file_path = self.resolve(path)?;
        match std::fs::read(file_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
