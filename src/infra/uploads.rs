//! Filesystem storage for uploaded images.
//!
//! Files live flat in a fixed directory under their sanitized original
//! filename; uploading the same name again overwrites the previous payload
//! (last writer wins). The database-side index is maintained separately by
//! the caller.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use slug::slugify;
use thiserror::Error;
use tokio::fs;

/// Extensions accepted by the image shelf.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Errors that can occur while interacting with the upload storage backend.
#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored filename")]
    InvalidPath,
    #[error("unsupported file extension")]
    UnsupportedExtension,
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed upload storage rooted at a single directory.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Store the payload under its sanitized name and return that name.
    pub async fn store(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<String, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let filename = sanitize_filename(original_name)?;
        let absolute = self.resolve(&filename)?;
        fs::write(&absolute, &data).await?;
        Ok(filename)
    }

    /// Read a stored payload into memory.
    pub async fn read(&self, filename: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(filename)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a stored payload. Missing files are treated as success.
    pub async fn delete(&self, filename: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(filename)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    /// Whether a payload currently exists under the given name.
    pub async fn exists(&self, filename: &str) -> Result<bool, UploadStorageError> {
        let absolute = self.resolve(filename)?;
        Ok(fs::try_exists(&absolute).await?)
    }

    /// Resolve the absolute filesystem path for a stored filename, rejecting
    /// anything that would escape the storage root.
    fn resolve(&self, filename: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(filename);
        let mut components = relative.components();
        let valid = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !valid || relative.is_absolute() {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

/// Lowercase extension of an allowed image filename, or `None`.
pub fn image_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)?;
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Reduce an arbitrary client-supplied filename to a safe stored name:
/// slugified stem plus the lowercased, allowed extension.
pub fn sanitize_filename(original: &str) -> Result<String, UploadStorageError> {
    let extension = image_extension(original).ok_or(UploadStorageError::UnsupportedExtension)?;

    let stem = Path::new(original)
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    Ok(format!("{base}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (UploadStorage, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let storage = UploadStorage::new(dir.path().join("uploads")).expect("storage root");
        (storage, dir)
    }

    #[test]
    fn sanitize_slugifies_stem_and_keeps_extension() {
        assert_eq!(sanitize_filename("My Photo.PNG").unwrap(), "my-photo.png");
        // Only the final path component survives; traversal segments are gone.
        assert_eq!(
            sanitize_filename("../../etc/passwd.jpg").unwrap(),
            "passwd.jpg"
        );
        assert!(matches!(
            sanitize_filename("notes.txt"),
            Err(UploadStorageError::UnsupportedExtension)
        ));
    }

    #[test]
    fn image_extension_is_case_insensitive() {
        assert_eq!(image_extension("a.WEBP").as_deref(), Some("webp"));
        assert_eq!(image_extension("archive.tar.gz"), None);
        assert_eq!(image_extension("no-extension"), None);
    }

    #[tokio::test]
    async fn store_read_delete_round_trip() {
        let (storage, _dir) = storage();

        let name = storage
            .store("Cover Art.png", Bytes::from_static(b"png-bytes"))
            .await
            .expect("store");
        assert_eq!(name, "cover-art.png");
        assert!(storage.exists(&name).await.expect("exists"));

        let data = storage.read(&name).await.expect("read");
        assert_eq!(&data[..], b"png-bytes");

        storage.delete(&name).await.expect("delete");
        assert!(!storage.exists(&name).await.expect("exists"));
    }

    #[tokio::test]
    async fn deleting_a_missing_file_is_success() {
        let (storage, _dir) = storage();
        storage.delete("ghost.png").await.expect("idempotent");
    }

    #[tokio::test]
    async fn same_name_is_last_writer_wins() {
        let (storage, _dir) = storage();
        storage
            .store("photo.png", Bytes::from_static(b"first"))
            .await
            .expect("store");
        storage
            .store("photo.png", Bytes::from_static(b"second"))
            .await
            .expect("store");
        let data = storage.read("photo.png").await.expect("read");
        assert_eq!(&data[..], b"second");
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let (storage, _dir) = storage();
        assert!(matches!(
            storage.read("../outside.png").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read("nested/inside.png").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }

    #[tokio::test]
    async fn empty_payloads_are_rejected() {
        let (storage, _dir) = storage();
        assert!(matches!(
            storage.store("photo.png", Bytes::new()).await,
            Err(UploadStorageError::EmptyPayload)
        ));
    }
}
