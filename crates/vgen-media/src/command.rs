//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::Frame;

/// Input path that tells FFmpeg to read from stdin.
pub const STDIN_INPUT: &str = "-";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Create a command that reads its input from stdin.
    pub fn from_stdin(output: impl AsRef<Path>) -> Self {
        Self::new(STDIN_INPUT, output)
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Describe raw RGB frames arriving on the input.
    pub fn raw_rgb_input(self, width: u32, height: u32, fps: u32) -> Self {
        self.input_arg("-f")
            .input_arg("rawvideo")
            .input_arg("-vcodec")
            .input_arg("rawvideo")
            .input_arg("-pix_fmt")
            .input_arg("rgb24")
            .input_arg("-s")
            .input_arg(format!("{}x{}", width, height))
            .input_arg("-r")
            .input_arg(fps.to_string())
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Drop audio from the output.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Set output pixel format.
    pub fn pixel_format(self, pix_fmt: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(pix_fmt)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Whether the command expects data on stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == STDIN_INPUT
    }

    /// Value following `flag` in the output arguments.
    pub fn output_value(&self, flag: &str) -> Option<&str> {
        self.output_args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.output_args.get(i + 1))
            .map(String::as_str)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Executes encoder commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command that reads its input from a file.
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()>;

    /// Run a command that reads raw RGB frames from stdin.
    async fn run_with_frames(&self, cmd: &FfmpegCommand, frames: &[Frame]) -> MediaResult<()>;
}

/// Runs commands against the FFmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: PathBuf,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a runner that resolves `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific FFmpeg binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn execute(&self, cmd: &FfmpegCommand, frames: Option<&[Frame]>) -> MediaResult<()> {
        check_ffmpeg(&self.binary)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let stdin = if frames.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;
        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        // FFmpeg exiting early breaks the pipe; a failed exit status takes
        // precedence over the write error.
        let mut write_error = None;
        if let Some(frames) = frames {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| MediaError::internal("stdin not captured"))?;
            for frame in frames {
                if let Err(e) = pipe.write_all(frame.as_raw()).await {
                    write_error = Some(e);
                    break;
                }
            }
            if write_error.is_none() {
                if let Err(e) = pipe.shutdown().await {
                    write_error = Some(e);
                }
            }
            drop(pipe);
        }

        let status = child.wait().await?;
        let stderr = stderr_handle.await.unwrap_or_default();

        if !status.success() {
            let detail = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| format!(": {}", l.trim()))
                .unwrap_or_default();
            warn!(code = ?status.code(), "FFmpeg exited with {}", status);
            return Err(MediaError::ffmpeg_failed(
                format!("FFmpeg exited with {}{}", status, detail),
                Some(stderr),
                status.code(),
            ));
        }

        match write_error {
            Some(e) => Err(MediaError::Io(e)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommandRunner for FfmpegRunner {
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.execute(cmd, None).await
    }

    async fn run_with_frames(&self, cmd: &FfmpegCommand, frames: &[Frame]) -> MediaResult<()> {
        if !cmd.reads_stdin() {
            return Err(MediaError::internal(
                "frame input requires a command reading from stdin",
            ));
        }
        self.execute(cmd, Some(frames)).await
    }
}

/// Resolve an FFmpeg binary, either a bare name looked up in PATH or a path.
pub fn check_ffmpeg(binary: impl AsRef<Path>) -> MediaResult<PathBuf> {
    which::which(binary.as_ref()).map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .video_filter("scale=-2:720")
            .video_codec("libx264")
            .crf(18);

        let args = cmd.build_args();
        assert_eq!(&args[..3], &["-y", "-v", "error"]);
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(cmd.output_value("-vf"), Some("scale=-2:720"));
        assert_eq!(cmd.output_value("-crf"), Some("18"));
        assert_eq!(args.last().map(String::as_str), Some("output.mp4"));
    }

    #[test]
    fn test_input_args_precede_input() {
        let cmd = FfmpegCommand::from_stdin("out.mp4").raw_rgb_input(960, 544, 24);
        let args = cmd.build_args();

        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let size_pos = args.iter().position(|a| a == "960x544").unwrap();
        assert!(size_pos < input_pos);
        assert_eq!(args[input_pos + 1], "-");
        assert!(cmd.reads_stdin());
    }

    #[test]
    fn test_file_input_does_not_read_stdin() {
        let cmd = FfmpegCommand::new("/tmp/in.mp4", "/tmp/out.mp4");
        assert!(!cmd.reads_stdin());
        assert_eq!(cmd.input(), Path::new("/tmp/in.mp4"));
        assert_eq!(cmd.output_value("-vf"), None);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = FfmpegRunner::new().with_binary("/nonexistent/ffmpeg-for-tests");
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4");
        let err = runner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound));
    }

    #[test]
    fn test_check_ffmpeg_resolves_configured_binary() {
        assert!(matches!(
            check_ffmpeg("/nonexistent/ffmpeg-for-tests"),
            Err(MediaError::FfmpegNotFound)
        ));

        #[cfg(unix)]
        assert_eq!(check_ffmpeg("/bin/sh").unwrap(), PathBuf::from("/bin/sh"));
    }

    #[tokio::test]
    async fn test_frames_require_stdin_command() {
        let runner = FfmpegRunner::new();
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4");
        let err = runner.run_with_frames(&cmd, &[]).await.unwrap_err();
        assert!(matches!(err, MediaError::Internal(_)));
    }
}
