//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    ConfigError(String),

    #[error("Supabase upload failed ({status}): {body}")]
    UploadFailed { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(status: u16, body: impl Into<String>) -> Self {
        Self::UploadFailed {
            status,
            body: body.into(),
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, StorageError::ConfigError(_))
    }
}
