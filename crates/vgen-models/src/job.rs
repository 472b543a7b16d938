//! Job identity and the runtime job envelope.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for one job invocation.
///
/// Used to namespace temporary files and to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form: anything outside `[A-Za-z0-9_-]` becomes `_`.
    pub fn path_segment(&self) -> String {
        let segment: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if segment.is_empty() {
            "job".to_string()
        } else {
            segment
        }
    }

    /// Short prefix used in uploaded file names.
    pub fn short(&self) -> String {
        self.path_segment().chars().take(8).collect()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job as delivered by the hosting runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeJob {
    pub id: JobId,
    /// Raw payload; validated by the handler
    #[serde(default)]
    pub input: serde_json::Value,
}
