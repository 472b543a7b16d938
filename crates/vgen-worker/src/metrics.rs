//! Prometheus metrics for the worker.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_TOTAL: &str = "vgen_jobs_total";
    pub const JOB_DURATION_SECONDS: &str = "vgen_job_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "vgen_stage_duration_seconds";
}

/// Pipeline stages timed per job.
pub mod stages {
    pub const GENERATE: &str = "generate";
    pub const UPSCALE: &str = "upscale";
    pub const UPLOAD: &str = "upload";
}

/// Install the Prometheus recorder with an HTTP scrape listener on `port`.
pub fn install_exporter(port: u16) -> WorkerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))?;
    info!("Serving Prometheus metrics on {}", addr);
    Ok(())
}

/// Record a finished job. `status` is `success`, `failed` or `rejected`.
pub fn record_job(mode: &str, status: &str, elapsed: Duration) {
    let labels = [("mode", mode.to_string()), ("status", status.to_string())];

    counter!(names::JOBS_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
}

/// Record how long one stage of a job took.
pub fn record_stage(mode: &str, stage: &str, elapsed: Duration) {
    let labels = [("mode", mode.to_string()), ("stage", stage.to_string())];

    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
}
