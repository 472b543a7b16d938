//! Duration clamping and frame-count derivation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest video a caller can request (seconds).
pub const MIN_SECONDS: f64 = 4.0;
/// Longest video a caller can request (seconds).
pub const MAX_SECONDS: f64 = 10.0;
/// Duration used when the payload omits `seconds`.
pub const DEFAULT_SECONDS: f64 = 8.0;
/// Frame rate used when the payload omits `fps`.
pub const DEFAULT_FPS: u32 = 24;

/// Lower frame bound (4s at 24fps).
pub const MIN_FRAMES: u32 = 96;
/// Upper frame bound (10s at 24fps).
pub const MAX_FRAMES: u32 = 240;

/// Clamp a requested duration into `[MIN_SECONDS, MAX_SECONDS]`.
///
/// Missing, zero and NaN inputs are treated as 0 and therefore resolve to
/// the minimum.
pub fn clamp_duration(seconds: Option<f64>) -> f64 {
    let seconds = match seconds {
        Some(s) if !s.is_nan() => s,
        _ => 0.0,
    };
    seconds.clamp(MIN_SECONDS, MAX_SECONDS)
}

/// Derive the number of frames to generate.
///
/// The `[MIN_FRAMES, MAX_FRAMES]` bounds are fixed and do not scale with
/// `fps`, so unusual frame rates get a frame count that no longer matches
/// `fps * seconds`.
pub fn seconds_to_frames(seconds: f64, fps: u32) -> u32 {
    let seconds = clamp_duration(Some(seconds));
    let frames = (seconds * f64::from(fps)).floor();
    // Saturating float-to-int cast; the clamp below bounds the result anyway.
    (frames as u32).clamp(MIN_FRAMES, MAX_FRAMES)
}

/// Pixel dimensions of a frame or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale to `height`, keeping the aspect ratio. Width is rounded to the
    /// nearest integer and never drops below 1.
    pub fn fit_height(&self, height: u32) -> Self {
        let aspect = f64::from(self.width) / f64::from(self.height.max(1));
        let width = (f64::from(height) * aspect).round().max(1.0) as u32;
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Frame plan derived from a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSpec {
    /// Frames to generate, always within `[MIN_FRAMES, MAX_FRAMES]`
    pub num_frames: u32,
    /// Output frame rate
    pub fps: u32,
}

impl FrameSpec {
    pub fn new(seconds: f64, fps: u32) -> Self {
        Self {
            num_frames: seconds_to_frames(seconds, fps),
            fps,
        }
    }
}
