//! Text-to-video and image-to-video orchestration.
//!
//! Both modes render at base resolution; upscaling happens afterwards.

use std::path::Path;

use tracing::{debug, info};
use vgen_inference::InferenceParams;
use vgen_media::{decode_image, export_frames, resize_to_height, Frame};
use vgen_models::{FrameSpec, GenerationMode, GenerationRequest, RenderedVideo, Resolution};

use crate::context::AppContext;
use crate::error::{WorkerError, WorkerResult};

/// Render a validated request into `job_dir`.
pub async fn generate(
    ctx: &AppContext,
    request: &GenerationRequest,
    job_dir: &Path,
) -> WorkerResult<RenderedVideo> {
    match request.mode {
        GenerationMode::T2v => generate_t2v(ctx, &request.prompt, &request.frames, job_dir).await,
        GenerationMode::I2v => {
            let image_url = request
                .image_url
                .as_deref()
                .ok_or(vgen_models::ValidationError::ImageUrlRequired)?;
            generate_i2v(ctx, &request.prompt, image_url, &request.frames, job_dir).await
        }
    }
}

/// Text-to-video at the fixed 960x544 base resolution.
pub async fn generate_t2v(
    ctx: &AppContext,
    prompt: &str,
    frames: &FrameSpec,
    job_dir: &Path,
) -> WorkerResult<RenderedVideo> {
    let mode = GenerationMode::T2v;
    let resolution = mode.profile().base_resolution.resolve(None);
    let params = InferenceParams::from_profile(
        mode.profile(),
        prompt,
        resolution,
        frames.num_frames,
        None,
    );

    render(ctx, mode, &params, frames.fps, job_dir).await
}

/// Image-to-video conditioned on the image at `image_url`, resized to the
/// base height with its aspect ratio kept.
pub async fn generate_i2v(
    ctx: &AppContext,
    prompt: &str,
    image_url: &str,
    frames: &FrameSpec,
    job_dir: &Path,
) -> WorkerResult<RenderedVideo> {
    let mode = GenerationMode::I2v;
    let source = fetch_image(ctx, image_url).await?;
    let resolution = mode
        .profile()
        .base_resolution
        .resolve(Some(Resolution::new(source.width(), source.height())));
    let image = resize_to_height(&source, resolution.height);
    debug!(
        "Source image {}x{} resized to {}",
        source.width(),
        source.height(),
        resolution
    );

    let params = InferenceParams::from_profile(
        mode.profile(),
        prompt,
        resolution,
        frames.num_frames,
        Some(image),
    );

    render(ctx, mode, &params, frames.fps, job_dir).await
}

async fn render(
    ctx: &AppContext,
    mode: GenerationMode,
    params: &InferenceParams,
    fps: u32,
    job_dir: &Path,
) -> WorkerResult<RenderedVideo> {
    let profile = mode.profile();
    info!(
        "Generating {} frames at {} ({})",
        params.num_frames, params.resolution, mode
    );

    let frames = ctx.pipeline(mode).generate(params).await?;
    let output = job_dir.join(format!("{}.mp4", profile.artifact_stem));
    let video = export_frames(
        ctx.runner.as_ref(),
        &frames,
        &output,
        fps,
        profile.export_quality,
    )
    .await?;

    Ok(video)
}

/// Download and decode the i2v source image.
async fn fetch_image(ctx: &AppContext, url: &str) -> WorkerResult<Frame> {
    let response = ctx
        .http
        .get(url)
        .send()
        .await
        .map_err(|e| WorkerError::image_fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(WorkerError::image_fetch(format!("{} returned {}", url, status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| WorkerError::image_fetch(e.to_string()))?;
    Ok(decode_image(&bytes)?)
}
