//! Inbound job payload and request validation.

use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

use crate::frames::{clamp_duration, FrameSpec, DEFAULT_FPS, DEFAULT_SECONDS};
use crate::mode::GenerationMode;
use crate::quality::Quality;

/// Errors reported back to the caller without attempting generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("prompt is required")]
    PromptRequired,

    #[error("image_url is required for i2v mode")]
    ImageUrlRequired,

    #[error("image_url must be an http(s) URL: {0}")]
    InvalidImageUrl(String),

    #[error("fps must be a positive integer")]
    InvalidFps,

    #[error("invalid job input: {0}")]
    InvalidInput(String),
}

/// Raw job payload as sent by the caller.
///
/// Every field is optional; numbers may also arrive as numeric strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobInput {
    /// "t2v" or "i2v" (default "t2v")
    #[serde(default)]
    pub mode: Option<String>,

    /// Text prompt (required)
    #[serde(default)]
    pub prompt: Option<String>,

    /// Requested duration in seconds, clamped to 4-10 (default 8)
    #[serde(default, deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub seconds: Option<f64>,

    /// Output frame rate (default 24)
    #[serde(default, deserialize_with = "lenient_i64")]
    #[schemars(with = "Option<i64>")]
    pub fps: Option<i64>,

    /// "540p", "720p" or "1080p" (default "540p")
    #[serde(default)]
    pub quality: Option<String>,

    /// Source image, required for i2v
    #[serde(default)]
    pub image_url: Option<String>,
}

impl JobInput {
    /// Parse the `input` object of a job. A missing/null input is an empty
    /// payload, which then fails prompt validation.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| ValidationError::InvalidInput(e.to_string()))
    }
}

/// A validated generation request. Seconds are clamped, quality normalized
/// and the mode resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub prompt: String,
    /// Clamped duration actually used
    pub seconds: f64,
    pub fps: u32,
    pub quality: Quality,
    /// Set only for i2v
    pub image_url: Option<String>,
    pub frames: FrameSpec,
    /// Quality was unsupported and replaced with the base tier
    #[serde(skip)]
    pub quality_adjusted: bool,
    /// Mode was unrecognized and coerced to t2v
    #[serde(skip)]
    pub mode_adjusted: bool,
}

impl GenerationRequest {
    /// Validate and normalize a raw payload.
    pub fn from_input(input: &JobInput) -> Result<Self, ValidationError> {
        let (mode, mode_adjusted) = GenerationMode::resolve(input.mode.as_deref());

        let prompt = input.prompt.as_deref().unwrap_or_default().trim();
        if prompt.is_empty() {
            return Err(ValidationError::PromptRequired);
        }

        let fps = match input.fps {
            None => DEFAULT_FPS,
            Some(fps) => u32::try_from(fps)
                .ok()
                .filter(|fps| *fps > 0)
                .ok_or(ValidationError::InvalidFps)?,
        };

        let resolved = Quality::resolve(input.quality.as_deref());
        let seconds = clamp_duration(Some(input.seconds.unwrap_or(DEFAULT_SECONDS)));

        let image_url = match mode {
            GenerationMode::I2v => {
                let raw = input
                    .image_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or(ValidationError::ImageUrlRequired)?;
                Some(validate_image_url(raw)?)
            }
            GenerationMode::T2v => None,
        };

        Ok(Self {
            mode,
            prompt: prompt.to_string(),
            seconds,
            fps,
            quality: resolved.quality,
            image_url,
            frames: FrameSpec::new(seconds, fps),
            quality_adjusted: resolved.adjusted,
            mode_adjusted,
        })
    }
}

fn validate_image_url(raw: &str) -> Result<String, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidImageUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(ValidationError::InvalidImageUrl(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

/// Integers, floats (truncated) and numeric strings.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<NumberOrString>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrString::Number(n)) => n,
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected an integer, got {:?}", s)))?,
    };
    if !value.is_finite() {
        return Err(D::Error::custom("expected a finite integer"));
    }
    Ok(Some(value.trunc() as i64))
}
