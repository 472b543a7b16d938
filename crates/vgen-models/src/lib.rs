//! Shared data models for the video generation worker.
//!
//! This crate provides Serde-serializable types for:
//! - Inbound job payloads and validated generation requests
//! - Duration clamping and frame-count derivation
//! - Quality tiers and their target resolutions
//! - Generation modes with their fixed pipeline parameters
//! - Job outputs (success and error payloads)

pub mod frames;
pub mod job;
pub mod mode;
pub mod quality;
pub mod request;
pub mod response;

pub use frames::{
    clamp_duration, seconds_to_frames, FrameSpec, Resolution, DEFAULT_FPS, DEFAULT_SECONDS,
    MAX_FRAMES, MAX_SECONDS, MIN_FRAMES, MIN_SECONDS,
};
pub use job::{JobId, RuntimeJob};
pub use mode::{BaseResolution, GenerationMode, ModeProfile, BASE_HEIGHT, MODEL_ID};
pub use quality::{Quality, ResolvedQuality};
pub use request::{GenerationRequest, JobInput, ValidationError};
pub use response::{JobOutput, RenderedVideo, UploadResult};
