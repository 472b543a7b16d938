//! Upscaling of rendered videos to the requested quality tier.

use std::path::{Path, PathBuf};

use tracing::info;
use vgen_models::{Quality, RenderedVideo, Resolution};

use crate::command::{CommandRunner, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// CRF used for upscaled output.
pub const UPSCALE_CRF: u8 = 18;
/// Encoder preset used for upscaled output.
pub const UPSCALE_PRESET: &str = "fast";

/// Output path for an upscaled copy: `<stem>_<quality>.mp4` next to the input.
pub fn upscaled_path(input: &Path, quality: Quality) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{}_{}.mp4", stem, quality))
}

/// Width FFmpeg picks for `scale=-2:<height>`: nearest even value that keeps
/// the aspect ratio.
fn scaled_resolution(source: Resolution, height: u32) -> Resolution {
    let pairs = (u64::from(height) * u64::from(source.width)) as f64
        / (2 * u64::from(source.height.max(1))) as f64;
    let width = (pairs.round() as u32).max(1) * 2;
    Resolution::new(width, height)
}

/// Upscale `video` to `quality`.
///
/// The base tier returns the input unchanged without running the encoder.
/// Encoder failures are returned as-is; there is no fallback to the
/// unscaled video.
pub async fn upscale_video(
    runner: &dyn CommandRunner,
    video: &RenderedVideo,
    quality: Quality,
) -> MediaResult<RenderedVideo> {
    let Some(height) = quality.upscale_height() else {
        return Ok(video.clone());
    };

    if !video.path.exists() {
        return Err(MediaError::FileNotFound(video.path.clone()));
    }

    let output = upscaled_path(&video.path, quality);

    let cmd = FfmpegCommand::new(&video.path, &output)
        .video_filter(format!("scale=-2:{}", height))
        .video_codec("libx264")
        .preset(UPSCALE_PRESET)
        .crf(UPSCALE_CRF)
        .audio_codec("copy");

    runner.run(&cmd).await?;

    let resolution = scaled_resolution(video.resolution, height);
    info!(
        quality = %quality,
        resolution = %resolution,
        "Upscaled {} to {}",
        video.path.display(),
        output.display()
    );

    Ok(RenderedVideo {
        path: output,
        resolution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frame;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<FfmpegCommand>>,
        fail_with: Option<i32>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
            self.commands.lock().unwrap().push(cmd.clone());
            match self.fail_with {
                Some(code) => Err(MediaError::ffmpeg_failed(
                    format!("FFmpeg exited with exit status: {}", code),
                    None,
                    Some(code),
                )),
                None => Ok(()),
            }
        }

        async fn run_with_frames(&self, cmd: &FfmpegCommand, _frames: &[Frame]) -> MediaResult<()> {
            self.run(cmd).await
        }
    }

    fn rendered(dir: &Path) -> RenderedVideo {
        let path = dir.join("output_t2v_540p.mp4");
        std::fs::write(&path, b"mp4").unwrap();
        RenderedVideo {
            path,
            resolution: Resolution::new(960, 544),
        }
    }

    #[tokio::test]
    async fn test_base_quality_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let video = rendered(dir.path());
        let runner = RecordingRunner::default();

        let out = upscale_video(&runner, &video, Quality::P540).await.unwrap();

        assert_eq!(out, video);
        assert!(runner.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_1080p_invokes_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let video = rendered(dir.path());
        let runner = RecordingRunner::default();

        let out = upscale_video(&runner, &video, Quality::P1080).await.unwrap();

        assert_ne!(out.path, video.path);
        assert_eq!(out.path, dir.path().join("output_t2v_540p_1080p.mp4"));
        assert_eq!(out.resolution, Resolution::new(1906, 1080));

        let commands = runner.commands.lock().unwrap();
        assert_eq!(commands.len(), 1);
        let cmd = &commands[0];
        assert_eq!(cmd.input(), video.path.as_path());
        assert_eq!(cmd.output_value("-vf"), Some("scale=-2:1080"));
        assert_eq!(cmd.output_value("-c:v"), Some("libx264"));
        assert_eq!(cmd.output_value("-preset"), Some("fast"));
        assert_eq!(cmd.output_value("-crf"), Some("18"));
        assert_eq!(cmd.output_value("-c:a"), Some("copy"));
    }

    #[tokio::test]
    async fn test_720p_target_height() {
        let dir = tempfile::tempdir().unwrap();
        let video = rendered(dir.path());
        let runner = RecordingRunner::default();

        let out = upscale_video(&runner, &video, Quality::P720).await.unwrap();

        assert_eq!(out.resolution, Resolution::new(1270, 720));
        assert_eq!(
            runner.commands.lock().unwrap()[0].output_value("-vf"),
            Some("scale=-2:720")
        );
    }

    #[tokio::test]
    async fn test_encoder_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let video = rendered(dir.path());
        let runner = RecordingRunner {
            fail_with: Some(1),
            ..Default::default()
        };

        let err = upscale_video(&runner, &video, Quality::P720).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let runner = RecordingRunner::default();
        let video = RenderedVideo {
            path: PathBuf::from("/nonexistent/video.mp4"),
            resolution: Resolution::new(960, 544),
        };
        let err = upscale_video(&runner, &video, Quality::P720).await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_upscaled_path() {
        assert_eq!(
            upscaled_path(Path::new("/tmp/job/base.mp4"), Quality::P720),
            PathBuf::from("/tmp/job/base_720p.mp4")
        );
    }
}
