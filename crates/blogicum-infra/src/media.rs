//! Local filesystem media storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use blogicum_core::ports::{MediaError, MediaStorage, MediaUpload};

/// Image extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Default upload limit: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Stores uploads as files under a root directory, each under a fresh
/// random name so uploads never overwrite each other.
pub struct LocalMediaStorage {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a stored relative path onto the root, refusing anything that
    /// could escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let path = Path::new(relative);
        let is_plain = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

/// Pick the file extension from the upload's name, falling back to its
/// declared content type.
fn extension_of(upload: &MediaUpload) -> Result<String, MediaError> {
    let from_name = Path::new(&upload.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let from_type = || {
        upload
            .content_type
            .as_deref()
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.iter().find(|e| ALLOWED_EXTENSIONS.contains(e)))
            .map(|e| e.to_string())
    };

    let ext = from_name.or_else(from_type).ok_or_else(|| {
        MediaError::UnsupportedType(upload.file_name.clone())
    })?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedType(ext))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, dir: &str, upload: MediaUpload) -> Result<String, MediaError> {
        if upload.data.is_empty() {
            return Err(MediaError::Empty);
        }
        if upload.data.len() > self.max_upload_bytes {
            return Err(MediaError::TooLarge {
                size: upload.data.len(),
                limit: self.max_upload_bytes,
            });
        }

        let ext = extension_of(&upload)?;
        let relative = format!("{dir}/{}.{ext}", Uuid::new_v4().simple());
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::Io(e.to_string()))?;
        }
        tokio::fs::write(&target, &upload.data)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::debug!(path = %relative, bytes = upload.data.len(), "Stored media file");
        Ok(relative)
    }

    async fn remove(&self, path: &str) -> Result<(), MediaError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }

    /// Read a stored file. Directories count as missing.
    async fn read(&self, path: &str) -> Result<Vec<u8>, MediaError> {
        let target = self.resolve(path)?;
        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(MediaError::NotFound),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(MediaError::NotFound),
            Err(e) => return Err(MediaError::Io(e.to_string())),
        }
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MediaError::NotFound),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, data: &[u8]) -> MediaUpload {
        MediaUpload {
            file_name: name.to_string(),
            content_type: None,
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_store_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), DEFAULT_MAX_UPLOAD_BYTES);

        let path = storage
            .store("posts_images", upload("Photo.JPG", b"\xff\xd8\xff"))
            .await
            .unwrap();

        assert!(path.starts_with("posts_images/"));
        assert!(path.ends_with(".jpg"));
        assert_eq!(storage.read(&path).await.unwrap(), b"\xff\xd8\xff");

        storage.remove(&path).await.unwrap();
        assert!(matches!(storage.read(&path).await, Err(MediaError::NotFound)));
        // Removing twice is fine.
        storage.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), DEFAULT_MAX_UPLOAD_BYTES);
        storage
            .store("posts_images", upload("a.png", b"\x89PNG"))
            .await
            .unwrap();

        assert!(matches!(
            storage.read("posts_images").await,
            Err(MediaError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_extension_from_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), DEFAULT_MAX_UPLOAD_BYTES);
        let mut file = upload("blob", b"\x89PNG");
        file.content_type = Some("image/png".to_string());

        let path = storage.store("posts_images", file).await.unwrap();

        assert!(path.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), 4);

        assert!(matches!(
            storage.store("posts_images", upload("a.png", b"")).await,
            Err(MediaError::Empty)
        ));
        assert!(matches!(
            storage.store("posts_images", upload("a.png", b"12345")).await,
            Err(MediaError::TooLarge { size: 5, limit: 4 })
        ));
        assert!(matches!(
            storage.store("posts_images", upload("a.exe", b"MZ")).await,
            Err(MediaError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), DEFAULT_MAX_UPLOAD_BYTES);

        for path in ["../secret", "/etc/passwd", "posts_images/../../x", ""] {
            assert!(
                matches!(storage.read(path).await, Err(MediaError::InvalidPath(_))),
                "{path} should be rejected"
            );
        }
    }
}
