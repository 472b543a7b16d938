//! Application context shared by every job.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;
use vgen_inference::{DiffusionPipeline, InferenceClient};
use vgen_media::{CommandRunner, FfmpegRunner};
use vgen_models::{GenerationMode, JobId};
use vgen_storage::{SupabaseStorage, VideoUploader};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Everything a job needs, built once at startup.
///
/// Pipelines are loaded before the first job and only read afterwards.
pub struct AppContext {
    pub config: WorkerConfig,
    pub t2v: Arc<dyn DiffusionPipeline>,
    pub i2v: Arc<dyn DiffusionPipeline>,
    pub runner: Arc<dyn CommandRunner>,
    pub uploader: Arc<dyn VideoUploader>,
    /// Client for fetching i2v source images
    pub http: Client,
}

impl AppContext {
    pub fn new(
        config: WorkerConfig,
        t2v: Arc<dyn DiffusionPipeline>,
        i2v: Arc<dyn DiffusionPipeline>,
        runner: Arc<dyn CommandRunner>,
        uploader: Arc<dyn VideoUploader>,
    ) -> WorkerResult<Self> {
        let http = Client::builder()
            .timeout(config.image_fetch_timeout)
            .build()?;

        Ok(Self {
            config,
            t2v,
            i2v,
            runner,
            uploader,
            http,
        })
    }

    /// Connect to the inference sidecar, load both pipelines and wire up the
    /// real encoder and uploader.
    pub async fn from_env(config: WorkerConfig) -> WorkerResult<Self> {
        let inference = InferenceClient::from_env()?;
        info!(
            "Waiting for inference service at {}",
            inference.config().base_url
        );
        inference
            .wait_until_healthy(config.health_poll_interval)
            .await?;

        let t2v = inference.load(GenerationMode::T2v).await?;
        let i2v = inference.load(GenerationMode::I2v).await?;
        info!("Pipelines loaded");

        let runner = FfmpegRunner::new().with_binary(config.ffmpeg_binary.clone());
        let uploader = SupabaseStorage::from_env()?;
        if !uploader.config().is_complete() {
            tracing::warn!("Supabase config incomplete; uploads will fail until it is set");
        }

        Self::new(
            config,
            Arc::new(t2v),
            Arc::new(i2v),
            Arc::new(runner),
            Arc::new(uploader),
        )
    }

    /// Pipeline serving `mode`.
    pub fn pipeline(&self, mode: GenerationMode) -> &Arc<dyn DiffusionPipeline> {
        match mode {
            GenerationMode::T2v => &self.t2v,
            GenerationMode::I2v => &self.i2v,
        }
    }

    /// Scratch directory owned by one job.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.config.work_dir.join(job_id.path_segment())
    }
}
