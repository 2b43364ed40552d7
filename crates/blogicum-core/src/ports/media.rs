//! Media storage port - where uploaded post images live.

use async_trait::async_trait;

/// Directory (relative to the media root) that post images are stored under.
pub const POST_IMAGES_DIR: &str = "posts_images";

/// An uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Storage for uploaded media files.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `upload` under `dir` and return its path relative to the media root.
    async fn store(&self, dir: &str, upload: MediaUpload) -> Result<String, MediaError>;

    /// Remove a previously stored file. Missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), MediaError>;

    /// Read a stored file back.
    async fn read(&self, path: &str) -> Result<Vec<u8>, MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Empty upload")]
    Empty,

    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Media file not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Io(String),
}

impl From<MediaError> for crate::error::DomainError {
    fn from(err: MediaError) -> Self {
        use crate::error::DomainError;

        match err {
            MediaError::UnsupportedType(_) | MediaError::TooLarge { .. } | MediaError::Empty => {
                DomainError::field("image", &err.to_string())
            }
            MediaError::InvalidPath(path) => DomainError::not_found("media", path),
            MediaError::NotFound => DomainError::not_found("media", ""),
            MediaError::Io(msg) => DomainError::Internal(msg),
        }
    }
}
