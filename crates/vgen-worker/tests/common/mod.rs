//! Shared fixtures for worker integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use vgen_inference::{DiffusionPipeline, InferenceParams, InferenceResult, PipelineSpec};
use vgen_media::{CommandRunner, FfmpegCommand, Frame, MediaResult};
use vgen_models::GenerationMode;

/// Pipeline returning solid frames of a fixed size.
pub struct SolidPipeline {
    spec: PipelineSpec,
    pub requested: Mutex<Vec<u32>>,
}

impl SolidPipeline {
    pub fn new(mode: GenerationMode) -> Arc<Self> {
        Arc::new(Self {
            spec: PipelineSpec::for_mode(mode),
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DiffusionPipeline for SolidPipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    async fn generate(&self, params: &InferenceParams) -> InferenceResult<Vec<Frame>> {
        self.requested.lock().unwrap().push(params.num_frames);
        Ok((0..params.num_frames)
            .map(|i| RgbImage::from_pixel(32, 16, Rgb([(i % 255) as u8, 64, 128])))
            .collect())
    }
}

/// Encoder stand-in that writes a placeholder output file.
#[derive(Default)]
pub struct TouchRunner {
    pub filters: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl CommandRunner for TouchRunner {
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.filters
            .lock()
            .unwrap()
            .push(cmd.output_value("-vf").map(str::to_string));
        std::fs::write(cmd.output(), b"mp4")?;
        Ok(())
    }

    async fn run_with_frames(&self, cmd: &FfmpegCommand, _frames: &[Frame]) -> MediaResult<()> {
        self.run(cmd).await
    }
}
