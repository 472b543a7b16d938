//! Fakes for the encoder, pipelines and uploader.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use vgen_inference::{DiffusionPipeline, InferenceError, InferenceParams, InferenceResult, PipelineSpec};
use vgen_media::{CommandRunner, FfmpegCommand, Frame, MediaError, MediaResult};
use vgen_models::{GenerationMode, UploadResult};
use vgen_storage::{StorageError, StorageResult, VideoUploader};

use crate::config::WorkerConfig;
use crate::context::AppContext;

/// Writes a placeholder file at the command's output and records the command.
#[derive(Default)]
pub struct FakeRunner {
    pub commands: Mutex<Vec<FfmpegCommand>>,
    pub fail_upscale: bool,
}

impl FakeRunner {
    pub fn failing_upscale() -> Self {
        Self {
            fail_upscale: true,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> Vec<FfmpegCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.commands.lock().unwrap().push(cmd.clone());
        if self.fail_upscale {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with status 1",
                Some("Unknown encoder 'libx264'".to_string()),
                Some(1),
            ));
        }
        std::fs::write(cmd.output(), b"upscaled")?;
        Ok(())
    }

    async fn run_with_frames(&self, cmd: &FfmpegCommand, _frames: &[Frame]) -> MediaResult<()> {
        self.commands.lock().unwrap().push(cmd.clone());
        std::fs::write(cmd.output(), b"rendered")?;
        Ok(())
    }
}

/// Returns small solid frames and records the parameters it was called with.
pub struct FakePipeline {
    spec: PipelineSpec,
    pub calls: Mutex<Vec<InferenceParams>>,
    pub fail: bool,
}

impl FakePipeline {
    pub fn new(mode: GenerationMode) -> Self {
        Self {
            spec: PipelineSpec::for_mode(mode),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(mode: GenerationMode) -> Self {
        Self {
            fail: true,
            ..Self::new(mode)
        }
    }

    pub fn calls(&self) -> Vec<InferenceParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiffusionPipeline for FakePipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    async fn generate(&self, params: &InferenceParams) -> InferenceResult<Vec<Frame>> {
        self.calls.lock().unwrap().push(params.clone());
        if self.fail {
            return Err(InferenceError::RequestFailed("CUDA out of memory".to_string()));
        }
        Ok((0..params.num_frames)
            .map(|_| RgbImage::from_pixel(8, 4, Rgb([0, 128, 255])))
            .collect())
    }
}

/// Records uploads; the file must exist at upload time.
#[derive(Default)]
pub struct FakeUploader {
    pub uploads: Mutex<Vec<(PathBuf, String)>>,
    pub fail: bool,
}

impl FakeUploader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoUploader for FakeUploader {
    async fn upload(&self, path: &Path, file_name: &str) -> StorageResult<UploadResult> {
        assert!(path.exists(), "uploaded file {} missing", path.display());
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_path_buf(), file_name.to_string()));
        if self.fail {
            return Err(StorageError::upload_failed(403, "new row violates policy"));
        }
        Ok(UploadResult {
            public_url: format!("https://cdn.test/files/{}", file_name),
        })
    }
}

/// A context wired with fakes, scratch space under `work_dir`.
pub struct TestHarness {
    pub ctx: AppContext,
    pub t2v: Arc<FakePipeline>,
    pub i2v: Arc<FakePipeline>,
    pub runner: Arc<FakeRunner>,
    pub uploader: Arc<FakeUploader>,
}

impl TestHarness {
    pub fn new(work_dir: &Path) -> Self {
        Self::with(
            work_dir,
            FakePipeline::new(GenerationMode::T2v),
            FakePipeline::new(GenerationMode::I2v),
            FakeRunner::default(),
            FakeUploader::default(),
        )
    }

    pub fn with(
        work_dir: &Path,
        t2v: FakePipeline,
        i2v: FakePipeline,
        runner: FakeRunner,
        uploader: FakeUploader,
    ) -> Self {
        let t2v = Arc::new(t2v);
        let i2v = Arc::new(i2v);
        let runner = Arc::new(runner);
        let uploader = Arc::new(uploader);
        let config = WorkerConfig {
            work_dir: work_dir.to_path_buf(),
            ..Default::default()
        };
        let ctx = AppContext::new(
            config,
            t2v.clone(),
            i2v.clone(),
            runner.clone(),
            uploader.clone(),
        )
        .unwrap();

        Self {
            ctx,
            t2v,
            i2v,
            runner,
            uploader,
        }
    }
}
