//! Generation modes and their fixed pipeline parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::frames::Resolution;

/// SkyReels-V2 diffusion-forcing checkpoint (540P). Both modes share it to
/// keep VRAM usage down.
pub const MODEL_ID: &str = "Skywork/SkyReels-V2-DF-14B-540P-Diffusers";

/// Height every mode renders at before upscaling.
pub const BASE_HEIGHT: u32 = 544;

/// How a mode picks its render resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseResolution {
    /// Always render at exactly this size.
    Fixed(Resolution),
    /// Render at this height with the width following the source image.
    FitHeight(u32),
}

impl BaseResolution {
    /// Resolve against the source image size, if any.
    pub fn resolve(&self, source: Option<Resolution>) -> Resolution {
        match (self, source) {
            (BaseResolution::Fixed(res), _) => *res,
            (BaseResolution::FitHeight(height), Some(src)) => src.fit_height(*height),
            (BaseResolution::FitHeight(height), None) => Resolution::new(*height, *height),
        }
    }
}

/// Constants a mode feeds into the diffusion pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeProfile {
    pub model_id: &'static str,
    /// Scheduler flow-shift (noise schedule warping)
    pub flow_shift: f32,
    pub base_resolution: BaseResolution,
    pub num_inference_steps: u32,
    pub base_num_frames: u32,
    /// `None` leaves the pipeline default in place
    pub guidance_scale: Option<f32>,
    /// 0 = synchronous generation, fine for clips of 10s or less
    pub ar_step: u32,
    pub overlap_history: Option<u32>,
    pub addnoise_condition: u32,
    /// Export quality on the 0-10 scale
    pub export_quality: u8,
    /// File stem of the rendered artifact
    pub artifact_stem: &'static str,
}

const T2V_PROFILE: ModeProfile = ModeProfile {
    model_id: MODEL_ID,
    flow_shift: 8.0,
    base_resolution: BaseResolution::Fixed(Resolution::new(960, BASE_HEIGHT)),
    num_inference_steps: 30,
    base_num_frames: 97,
    guidance_scale: None,
    ar_step: 0,
    overlap_history: None,
    addnoise_condition: 20,
    export_quality: 8,
    artifact_stem: "output_t2v_540p",
};

const I2V_PROFILE: ModeProfile = ModeProfile {
    model_id: MODEL_ID,
    flow_shift: 5.0,
    base_resolution: BaseResolution::FitHeight(BASE_HEIGHT),
    num_inference_steps: 30,
    base_num_frames: 97,
    guidance_scale: Some(5.0),
    ar_step: 0,
    overlap_history: None,
    addnoise_condition: 20,
    export_quality: 8,
    artifact_stem: "output_i2v_540p",
};

/// Generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Text to video
    #[default]
    T2v,
    /// Image (plus text) to video
    I2v,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::T2v => "t2v",
            GenerationMode::I2v => "i2v",
        }
    }

    pub fn profile(&self) -> &'static ModeProfile {
        match self {
            GenerationMode::T2v => &T2V_PROFILE,
            GenerationMode::I2v => &I2V_PROFILE,
        }
    }

    /// Parse a requested mode the way the dispatcher always has: anything
    /// other than `i2v` runs text-to-video. The flag reports whether an
    /// unrecognized value was coerced.
    pub fn resolve(requested: Option<&str>) -> (GenerationMode, bool) {
        match requested {
            None => (GenerationMode::default(), false),
            Some(raw) => match raw.parse::<GenerationMode>() {
                Ok(mode) => (mode, false),
                Err(_) => (GenerationMode::T2v, true),
            },
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "t2v" => Ok(GenerationMode::T2v),
            "i2v" => Ok(GenerationMode::I2v),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown generation mode: {0}")]
pub struct ModeParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t2v_profile() {
        let p = GenerationMode::T2v.profile();
        assert_eq!(p.flow_shift, 8.0);
        assert_eq!(p.num_inference_steps, 30);
        assert_eq!(p.base_num_frames, 97);
        assert_eq!(p.ar_step, 0);
        assert_eq!(p.guidance_scale, None);
        assert_eq!(p.base_resolution.resolve(None), Resolution::new(960, 544));
    }

    #[test]
    fn test_i2v_profile_follows_source_aspect() {
        let p = GenerationMode::I2v.profile();
        assert_eq!(p.flow_shift, 5.0);
        assert_eq!(p.guidance_scale, Some(5.0));

        let res = p.base_resolution.resolve(Some(Resolution::new(1280, 720)));
        assert_eq!(res, Resolution::new(967, 544));
    }

    #[test]
    fn test_profiles_use_distinct_artifacts() {
        assert_ne!(
            GenerationMode::T2v.profile().artifact_stem,
            GenerationMode::I2v.profile().artifact_stem
        );
    }

    #[test]
    fn test_profiles_export_at_quality_8() {
        assert_eq!(GenerationMode::T2v.profile().export_quality, 8);
        assert_eq!(GenerationMode::I2v.profile().export_quality, 8);
    }

    #[test]
    fn test_resolve_mode() {
        assert_eq!(GenerationMode::resolve(None), (GenerationMode::T2v, false));
        assert_eq!(GenerationMode::resolve(Some("I2V")), (GenerationMode::I2v, false));
        assert_eq!(GenerationMode::resolve(Some("t2v")), (GenerationMode::T2v, false));
        assert_eq!(GenerationMode::resolve(Some("v2v")), (GenerationMode::T2v, true));
    }
}
