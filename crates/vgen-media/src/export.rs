//! Export of generated frames to an MP4 file.

use std::path::Path;

use tracing::info;
use vgen_models::{RenderedVideo, Resolution};

use crate::command::{CommandRunner, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::Frame;

/// Encoder block size; frame dimensions are scaled up to a multiple of it.
const MACRO_BLOCK_SIZE: u32 = 16;

/// Map a 0-10 quality level to libx264 CRF (10 = best, 0 = worst).
pub fn quality_to_crf(level: u8) -> u8 {
    let level = f64::from(level.min(10));
    ((1.0 - level / 10.0) * 51.0) as u8
}

fn align_to_block(value: u32) -> u32 {
    value.div_ceil(MACRO_BLOCK_SIZE) * MACRO_BLOCK_SIZE
}

/// Encode `frames` into an H.264 MP4 at `output`.
///
/// All frames must share the same dimensions. Dimensions that are not a
/// multiple of 16 are scaled up to the next multiple.
pub async fn export_frames(
    runner: &dyn CommandRunner,
    frames: &[Frame],
    output: &Path,
    fps: u32,
    quality: u8,
) -> MediaResult<RenderedVideo> {
    let first = frames
        .first()
        .ok_or_else(|| MediaError::invalid_frames("no frames to export"))?;
    let source = Resolution::new(first.width(), first.height());

    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.width() != source.width || f.height() != source.height)
    {
        return Err(MediaError::invalid_frames(format!(
            "frame {} is {}x{}, expected {}",
            index,
            frame.width(),
            frame.height(),
            source
        )));
    }

    if fps == 0 {
        return Err(MediaError::invalid_frames("fps must be positive"));
    }

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let aligned = Resolution::new(align_to_block(source.width), align_to_block(source.height));

    let mut cmd = FfmpegCommand::from_stdin(output)
        .raw_rgb_input(source.width, source.height, fps)
        .no_audio()
        .video_codec("libx264")
        .pixel_format("yuv420p")
        .crf(quality_to_crf(quality));

    if aligned != source {
        cmd = cmd.video_filter(format!("scale={}:{}", aligned.width, aligned.height));
    }

    runner.run_with_frames(&cmd, frames).await?;

    info!(
        frames = frames.len(),
        fps,
        resolution = %aligned,
        "Exported video to {}",
        output.display()
    );

    Ok(RenderedVideo {
        path: output.to_path_buf(),
        resolution: aligned,
    })
}
