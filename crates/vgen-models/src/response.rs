//! Job outputs and transient pipeline artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::frames::Resolution;
use crate::mode::GenerationMode;
use crate::quality::Quality;

/// A video file produced by the export or upscale step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub resolution: Resolution,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub public_url: String,
}

/// Payload returned to the caller for every job.
///
/// Failures are data too: callers check for the `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum JobOutput {
    Success {
        mode: GenerationMode,
        /// Clamped duration actually used
        seconds: f64,
        fps: u32,
        quality: Quality,
        video_url: String,
    },
    Error {
        error: String,
    },
}

impl JobOutput {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JobOutput::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            JobOutput::Error { error } => Some(error),
            JobOutput::Success { .. } => None,
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        match self {
            JobOutput::Success { video_url, .. } => Some(video_url),
            JobOutput::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let output = JobOutput::Success {
            mode: GenerationMode::T2v,
            seconds: 8.0,
            fps: 24,
            quality: Quality::P720,
            video_url: "https://x.supabase.co/storage/v1/object/public/files/a.mp4".into(),
        };
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "mode": "t2v",
                "seconds": 8.0,
                "fps": 24,
                "quality": "720p",
                "video_url": "https://x.supabase.co/storage/v1/object/public/files/a.mp4"
            })
        );
        assert!(!output.is_error());
    }

    #[test]
    fn test_error_shape_has_only_error_key() {
        let output = JobOutput::error("prompt is required");
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({"error": "prompt is required"})
        );
        assert_eq!(output.error_message(), Some("prompt is required"));
        assert_eq!(output.video_url(), None);
    }

    #[test]
    fn test_roundtrip_from_runtime_json() {
        let output: JobOutput = serde_json::from_value(json!({"error": "boom"})).unwrap();
        assert!(output.is_error());
    }
}
