//! Structured job logging.

use std::time::Duration;

use tracing::{error, info, warn, Span};
use vgen_models::{GenerationMode, JobId};

/// Attaches `job_id`, `operation` and, once known, `mode` to every job
/// lifecycle event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
    mode: Option<GenerationMode>,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
            mode: None,
        }
    }

    /// Same logger, tagged with the resolved generation mode.
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    fn mode_label(&self) -> &'static str {
        self.mode.map(|m| m.as_str()).unwrap_or("-")
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            mode = self.mode_label(),
            "Job started: {}", message
        );
    }

    /// Log the end of a pipeline stage with its duration.
    pub fn log_stage(&self, stage: &str, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            mode = self.mode_label(),
            stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage {} finished", stage
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            mode = self.mode_label(),
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            mode = self.mode_label(),
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            mode = self.mode_label(),
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn mode(&self) -> Option<GenerationMode> {
        self.mode
    }

    /// Span covering the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
