mod fs_storage;
mod trait_def;

pub use fs_storage::FsPhotoStorage;
pub use trait_def::{PhotoStorage, PhotoStorageError};

#[cfg(test)]
pub use trait_def::MockPhotoStorage;

/// Sniffs `bytes` and returns the image mime type, or `None` if the content
/// is not a recognized image.
pub fn image_mime_type(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
}
