//! Inference sidecar request/response types.

use serde::{Deserialize, Serialize};

/// Request to load a pipeline into the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    pub model_id: String,
    /// Scheduler flow-shift
    pub flow_shift: f32,
}

/// Request to generate frames with a loaded pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Base64 PNG conditioning image (i2v only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub height: u32,
    pub width: u32,
    pub num_frames: u32,
    pub base_num_frames: u32,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    pub ar_step: u32,
    pub overlap_history: Option<u32>,
    pub addnoise_condition: u32,
    /// Run without gradient tracking
    pub inference_mode: bool,
}

/// Generated frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub width: u32,
    pub height: u32,
    /// Base64 PNG frames in playback order
    pub frames: Vec<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
