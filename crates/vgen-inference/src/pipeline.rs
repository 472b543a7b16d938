//! The diffusion pipeline seam.

use async_trait::async_trait;
use vgen_media::Frame;
use vgen_models::{GenerationMode, ModeProfile, Resolution};

use crate::error::InferenceResult;

/// What a loaded pipeline is: its mode, checkpoint and scheduler tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub mode: GenerationMode,
    pub model_id: String,
    pub flow_shift: f32,
}

impl PipelineSpec {
    pub fn for_mode(mode: GenerationMode) -> Self {
        let profile = mode.profile();
        Self {
            mode,
            model_id: profile.model_id.to_string(),
            flow_shift: profile.flow_shift,
        }
    }
}

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct InferenceParams {
    pub prompt: String,
    /// Conditioning image, already resized to `resolution`
    pub image: Option<Frame>,
    pub resolution: Resolution,
    pub num_frames: u32,
    pub base_num_frames: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: Option<f32>,
    pub ar_step: u32,
    pub overlap_history: Option<u32>,
    pub addnoise_condition: u32,
}

impl InferenceParams {
    /// Build parameters from a mode profile.
    pub fn from_profile(
        profile: &ModeProfile,
        prompt: impl Into<String>,
        resolution: Resolution,
        num_frames: u32,
        image: Option<Frame>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            resolution,
            num_frames,
            base_num_frames: profile.base_num_frames,
            num_inference_steps: profile.num_inference_steps,
            guidance_scale: profile.guidance_scale,
            ar_step: profile.ar_step,
            overlap_history: profile.overlap_history,
            addnoise_condition: profile.addnoise_condition,
        }
    }
}

/// A loaded video-diffusion pipeline.
///
/// Implementations are loaded once and shared read-only for the worker's
/// lifetime.
#[async_trait]
pub trait DiffusionPipeline: Send + Sync {
    fn spec(&self) -> &PipelineSpec;

    /// Run forward inference and return the generated frames.
    async fn generate(&self, params: &InferenceParams) -> InferenceResult<Vec<Frame>>;
}
