//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for per-job scratch directories
    pub work_dir: PathBuf,
    /// FFmpeg binary to run
    pub ffmpeg_binary: PathBuf,
    /// Timeout for downloading the i2v source image
    pub image_fetch_timeout: Duration,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
    /// Interval between inference health probes at startup
    pub health_poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vgen"),
            ffmpeg_binary: PathBuf::from("ffmpeg"),
            image_fetch_timeout: Duration::from_secs(60),
            metrics_port: None,
            health_poll_interval: Duration::from_secs(5),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/vgen")),
            ffmpeg_binary: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffmpeg")),
            image_fetch_timeout: Duration::from_secs(
                std::env::var("IMAGE_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            health_poll_interval: Duration::from_secs(
                std::env::var("INFERENCE_HEALTH_POLL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Hosting runtime endpoints.
///
/// URLs carry a `$ID` placeholder: the worker id for job takes, the job id
/// for output posts.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub job_take_url: Option<String>,
    pub job_done_url: Option<String>,
    pub api_key: Option<String>,
    pub worker_id: String,
    /// Wait between empty job takes
    pub poll_interval: Duration,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("job_take_url", &self.job_take_url)
            .field("job_done_url", &self.job_done_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("worker_id", &self.worker_id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl RuntimeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            job_take_url: non_empty("RUNPOD_WEBHOOK_GET_JOB"),
            job_done_url: non_empty("RUNPOD_WEBHOOK_POST_OUTPUT"),
            api_key: non_empty("RUNPOD_AI_API_KEY"),
            worker_id: non_empty("RUNPOD_POD_ID")
                .unwrap_or_else(|| format!("worker-{}", uuid::Uuid::new_v4())),
            poll_interval: Duration::from_millis(
                lookup("RUNPOD_POLL_INTERVAL_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
        }
    }

    /// URL to take the next job from.
    pub fn take_url(&self) -> WorkerResult<String> {
        let url = self
            .job_take_url
            .as_deref()
            .ok_or_else(|| WorkerError::config_error("RUNPOD_WEBHOOK_GET_JOB is not set"))?;
        Ok(url.replace("$ID", &self.worker_id))
    }

    /// URL to post the output of `job_id` to.
    pub fn done_url(&self, job_id: &str) -> WorkerResult<String> {
        let url = self
            .job_done_url
            .as_deref()
            .ok_or_else(|| WorkerError::config_error("RUNPOD_WEBHOOK_POST_OUTPUT is not set"))?;
        Ok(url.replace("$ID", job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn runtime(vars: &[(&str, &str)]) -> RuntimeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/vgen"));
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_runtime_urls() {
        let config = runtime(&[
            ("RUNPOD_WEBHOOK_GET_JOB", "https://api.runpod.ai/v2/ep/job-take/$ID"),
            ("RUNPOD_WEBHOOK_POST_OUTPUT", "https://api.runpod.ai/v2/ep/job-done/$ID"),
            ("RUNPOD_POD_ID", "pod-7"),
        ]);

        assert_eq!(
            config.take_url().unwrap(),
            "https://api.runpod.ai/v2/ep/job-take/pod-7"
        );
        assert_eq!(
            config.done_url("job-42").unwrap(),
            "https://api.runpod.ai/v2/ep/job-done/job-42"
        );
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn test_runtime_missing_urls() {
        let config = runtime(&[("RUNPOD_WEBHOOK_GET_JOB", " ")]);
        assert!(config.take_url().is_err());
        assert!(config.done_url("x").is_err());
        assert!(config.worker_id.starts_with("worker-"));
    }

    #[test]
    fn test_runtime_debug_redacts_key() {
        let config = runtime(&[("RUNPOD_AI_API_KEY", "secret-key")]);
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
