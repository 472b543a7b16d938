//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors raised while running a job or talking to the runtime.
///
/// Wrapped crate errors are transparent: their message is what ends up in the
/// `error` field of the job output.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to fetch image_url: {0}")]
    ImageFetch(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runtime API error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Validation(#[from] vgen_models::ValidationError),

    #[error(transparent)]
    Media(#[from] vgen_media::MediaError),

    #[error(transparent)]
    Storage(#[from] vgen_storage::StorageError),

    #[error(transparent)]
    Inference(#[from] vgen_inference::InferenceError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn image_fetch(msg: impl Into<String>) -> Self {
        Self::ImageFetch(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Label used for the `stage` of failure metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::ImageFetch(_) => "image_fetch",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Runtime(_) => "runtime",
            WorkerError::Validation(_) => "validation",
            WorkerError::Media(_) => "media",
            WorkerError::Storage(_) => "storage",
            WorkerError::Inference(_) => "inference",
            WorkerError::Network(_) => "network",
            WorkerError::Json(_) => "json",
            WorkerError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_messages_pass_through() {
        let err: WorkerError = vgen_models::ValidationError::PromptRequired.into();
        assert_eq!(err.to_string(), "prompt is required");

        let err: WorkerError = vgen_storage::StorageError::upload_failed(500, "boom").into();
        assert_eq!(err.to_string(), "Supabase upload failed (500): boom");
        assert_eq!(err.kind(), "storage");
    }
}
