//! Output quality tiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported output quality tiers.
///
/// Generation always happens at the base tier; higher tiers are produced by
/// upscaling the rendered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Quality {
    #[default]
    #[serde(rename = "540p")]
    P540,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

/// Outcome of [`Quality::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQuality {
    pub quality: Quality,
    /// True when the requested value was not a supported tier and the base
    /// tier was substituted.
    pub adjusted: bool,
}

impl Quality {
    pub const ALL: &'static [Quality] = &[Quality::P540, Quality::P720, Quality::P1080];

    /// Normalize a requested tier.
    ///
    /// Matching is case-insensitive. Unsupported values silently fall back to
    /// 540p with `adjusted` set; an absent value is the default, not an
    /// adjustment.
    pub fn resolve(requested: Option<&str>) -> ResolvedQuality {
        match requested {
            None => ResolvedQuality {
                quality: Quality::default(),
                adjusted: false,
            },
            Some(raw) => match raw.parse::<Quality>() {
                Ok(quality) => ResolvedQuality {
                    quality,
                    adjusted: false,
                },
                Err(_) => ResolvedQuality {
                    quality: Quality::default(),
                    adjusted: true,
                },
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P540 => "540p",
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
        }
    }

    /// Target height for the upscaler. `None` means the rendered video is
    /// used as-is.
    pub fn upscale_height(&self) -> Option<u32> {
        match self {
            Quality::P540 => None,
            Quality::P720 => Some(720),
            Quality::P1080 => Some(1080),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Quality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "540p" => Ok(Quality::P540),
            "720p" => Ok(Quality::P720),
            "1080p" => Ok(Quality::P1080),
            _ => Err(QualityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown quality: {0}")]
pub struct QualityParseError(String);
