//! Job loop against the hosting runtime, plus local one-shot runs.

use std::path::Path;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vgen_models::{JobId, JobOutput, RuntimeJob};

use crate::config::RuntimeConfig;
use crate::context::AppContext;
use crate::error::{WorkerError, WorkerResult};
use crate::handler::handle_job;

/// Takes jobs from the runtime one at a time and posts their output back.
pub struct JobExecutor {
    ctx: Arc<AppContext>,
    runtime: RuntimeConfig,
    http: Client,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(ctx: Arc<AppContext>, runtime: RuntimeConfig) -> WorkerResult<Self> {
        let http = Client::builder().build()?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            ctx,
            runtime,
            http,
            shutdown,
        })
    }

    /// Sender that stops the loop when `true` is sent.
    pub fn shutdown_sender(&self) -> watch::Sender<bool> {
        self.shutdown.clone()
    }

    /// Run until shutdown. An in-flight job is finished before returning.
    pub async fn run(&self) -> WorkerResult<()> {
        // Fail fast on missing endpoints.
        self.runtime.take_url()?;
        self.runtime.done_url("")?;

        info!("Starting job executor '{}'", self.runtime.worker_id);
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let next = tokio::select! {
                _ = shutdown_rx.changed() => continue,
                next = self.take_job() => next,
            };

            match next {
                Ok(Some(job)) => {
                    if let Err(e) = self.process_job(job).await {
                        error!("Failed to report job output: {}", e);
                    }
                }
                Ok(None) => self.idle(&mut shutdown_rx).await,
                Err(e) => {
                    warn!("Failed to take job: {}", e);
                    self.idle(&mut shutdown_rx).await;
                }
            }
        }

        info!("Job executor stopped");
        Ok(())
    }

    async fn idle(&self, shutdown_rx: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = shutdown_rx.changed() => {}
            _ = tokio::time::sleep(self.runtime.poll_interval) => {}
        }
    }

    /// Take the next job, `None` when the runtime has nothing queued.
    pub async fn take_job(&self) -> WorkerResult<Option<RuntimeJob>> {
        let url = self.runtime.take_url()?;
        let mut request = self.http.get(&url);
        if let Some(key) = &self.runtime.api_key {
            request = request.header(AUTHORIZATION, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::runtime(format!(
                "job take returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let job: RuntimeJob = serde_json::from_str(&body)?;
        debug!("Took job {}", job.id);
        Ok(Some(job))
    }

    /// Post `{"output": ...}` for a finished job.
    pub async fn post_output(&self, job_id: &JobId, output: &JobOutput) -> WorkerResult<()> {
        let url = self.runtime.done_url(job_id.as_str())?;
        let mut request = self.http.post(&url).json(&json!({ "output": output }));
        if let Some(key) = &self.runtime.api_key {
            request = request.header(AUTHORIZATION, key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::runtime(format!(
                "job done returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    /// Handle one job and report its output.
    pub async fn process_job(&self, job: RuntimeJob) -> WorkerResult<()> {
        let output = handle_job(&self.ctx, &job.id, job.input).await;
        self.post_output(&job.id, &output).await
    }
}

/// Find a local test payload: `--test_input <json>` / `--test_input=<json>`
/// on the command line, otherwise `fallback` if that file exists.
///
/// The payload may be a `{"input": ...}` envelope or the input itself.
pub async fn load_test_input(args: &[String], fallback: &Path) -> WorkerResult<Option<Value>> {
    let mut raw = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--test_input" {
            let value = iter
                .next()
                .ok_or_else(|| WorkerError::config_error("--test_input requires a JSON value"))?;
            raw = Some(value.clone());
            break;
        }
        if let Some(value) = arg.strip_prefix("--test_input=") {
            raw = Some(value.to_string());
            break;
        }
    }

    let raw = match raw {
        Some(raw) => raw,
        None => match tokio::fs::read_to_string(fallback).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        },
    };

    let mut value: Value = serde_json::from_str(&raw)?;
    Ok(Some(match value.get_mut("input") {
        Some(input) => input.take(),
        None => value,
    }))
}

/// Run one job locally, outside the runtime loop.
pub async fn run_local(ctx: &AppContext, input: Value) -> JobOutput {
    let job_id = JobId::new();
    info!("Running local test job {}", job_id);
    handle_job(ctx, &job_id, input).await
}
