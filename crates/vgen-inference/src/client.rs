//! Inference sidecar HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info, warn};
use vgen_media::{decode_image, encode_png, Frame};
use vgen_models::GenerationMode;

use crate::error::{InferenceError, InferenceResult};
use crate::pipeline::{DiffusionPipeline, InferenceParams, PipelineSpec};
use crate::types::{GenerateRequest, GenerateResponse, HealthResponse, LoadRequest};

const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct InferenceClientConfig {
    /// Base URL of the inference sidecar
    pub base_url: String,
    /// Request timeout, covering a full generation
    pub timeout: Duration,
    /// How long to wait for the sidecar to come up at startup
    pub startup_timeout: Duration,
}

impl Default for InferenceClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(1800),
            startup_timeout: Duration::from_secs(600),
        }
    }
}

impl InferenceClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("INFERENCE_SERVICE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("INFERENCE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            startup_timeout: Duration::from_secs(
                std::env::var("INFERENCE_STARTUP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// Client for the inference sidecar.
#[derive(Clone)]
pub struct InferenceClient {
    http: Client,
    config: InferenceClientConfig,
}

impl InferenceClient {
    pub fn new(config: InferenceClientConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(InferenceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> InferenceResult<Self> {
        Self::new(InferenceClientConfig::from_env())
    }

    pub fn config(&self) -> &InferenceClientConfig {
        &self.config
    }

    /// Check if the sidecar is healthy.
    pub async fn health_check(&self) -> InferenceResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthResponse>().await {
                    Ok(health) => Ok(health.status == "healthy" || health.status == "ok"),
                    Err(e) => {
                        warn!("Inference health check returned an unreadable body: {}", e);
                        Ok(false)
                    }
                }
            }
            Ok(response) => {
                warn!("Inference health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Inference health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Poll the health endpoint until it reports healthy or the startup
    /// timeout elapses.
    pub async fn wait_until_healthy(&self, interval: Duration) -> InferenceResult<()> {
        let deadline = Instant::now() + self.config.startup_timeout;
        loop {
            if self.health_check().await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(InferenceError::ServiceUnavailable(format!(
                    "{} not healthy after {:?}",
                    self.config.base_url, self.config.startup_timeout
                )));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Load the pipeline for `mode` and return a handle to it.
    pub async fn load(&self, mode: GenerationMode) -> InferenceResult<RemotePipeline> {
        let spec = PipelineSpec::for_mode(mode);
        let url = format!("{}/pipelines/{}/load", self.config.base_url, mode);

        info!(
            "Loading {} pipeline {} (flow_shift={})",
            mode, spec.model_id, spec.flow_shift
        );

        let response = self
            .http
            .post(&url)
            .json(&LoadRequest {
                model_id: spec.model_id.clone(),
                flow_shift: spec.flow_shift,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed(format!(
                "load {} returned {}: {}",
                mode, status, body
            )));
        }

        Ok(RemotePipeline {
            client: self.clone(),
            spec,
        })
    }
}

/// A pipeline loaded in the inference sidecar.
#[derive(Clone)]
pub struct RemotePipeline {
    client: InferenceClient,
    spec: PipelineSpec,
}

impl RemotePipeline {
    fn build_request(&self, params: &InferenceParams) -> InferenceResult<GenerateRequest> {
        let image = match &params.image {
            Some(frame) => Some(STANDARD.encode(encode_png(frame)?)),
            None => None,
        };

        Ok(GenerateRequest {
            prompt: params.prompt.clone(),
            image,
            height: params.resolution.height,
            width: params.resolution.width,
            num_frames: params.num_frames,
            base_num_frames: params.base_num_frames,
            num_inference_steps: params.num_inference_steps,
            guidance_scale: params.guidance_scale,
            ar_step: params.ar_step,
            overlap_history: params.overlap_history,
            addnoise_condition: params.addnoise_condition,
            inference_mode: true,
        })
    }
}

fn decode_frames(response: GenerateResponse) -> InferenceResult<Vec<Frame>> {
    if response.frames.is_empty() {
        return Err(InferenceError::invalid_response("no frames returned"));
    }

    response
        .frames
        .iter()
        .enumerate()
        .map(|(index, encoded)| {
            let bytes = STANDARD.decode(encoded).map_err(|e| {
                InferenceError::invalid_response(format!("frame {}: {}", index, e))
            })?;
            let frame = decode_image(&bytes)?;
            if frame.dimensions() != (response.width, response.height) {
                return Err(InferenceError::invalid_response(format!(
                    "frame {} is {}x{}, expected {}x{}",
                    index,
                    frame.width(),
                    frame.height(),
                    response.width,
                    response.height
                )));
            }
            Ok(frame)
        })
        .collect()
}

#[async_trait]
impl DiffusionPipeline for RemotePipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    async fn generate(&self, params: &InferenceParams) -> InferenceResult<Vec<Frame>> {
        let url = format!(
            "{}/pipelines/{}/generate",
            self.client.config.base_url, self.spec.mode
        );
        let request = self.build_request(params)?;

        debug!(
            "Requesting {} frames at {} from {}",
            params.num_frames, params.resolution, url
        );

        let response = self.client.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed(format!(
                "inference service returned {}: {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response.json().await?;
        let frames = decode_frames(generated)?;
        if frames.len() != params.num_frames as usize {
            debug!(
                "Pipeline returned {} frames for {} requested",
                frames.len(),
                params.num_frames
            );
        }
        Ok(frames)
    }
}
