//! FFmpeg CLI wrapper for the generation pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner trait so encoder invocations can be swapped in tests
//! - Export of raw RGB frames to an H.264 MP4
//! - Upscaling of rendered videos to the requested quality tier
//! - Source image decoding and resizing

pub mod command;
pub mod error;
pub mod export;
pub mod image_prep;
pub mod upscale;

pub use command::{check_ffmpeg, CommandRunner, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use export::{export_frames, quality_to_crf};
pub use image_prep::{decode_image, encode_png, resize_to_height};
pub use upscale::{upscale_video, upscaled_path, UPSCALE_CRF, UPSCALE_PRESET};

/// Frame type exchanged with the inference engine.
pub type Frame = image::RgbImage;
