//! Diffusion pipeline seam and client for the inference sidecar.
//!
//! The SkyReels-V2 pipelines run inside an ML framework hosted by a sidecar
//! process. This crate provides:
//! - The `DiffusionPipeline` trait the worker generates frames through
//! - Per-mode pipeline specs and inference parameters
//! - `InferenceClient`/`RemotePipeline`, the HTTP implementation

pub mod client;
pub mod error;
pub mod pipeline;
pub mod types;

pub use client::{InferenceClient, InferenceClientConfig, RemotePipeline};
pub use error::{InferenceError, InferenceResult};
pub use pipeline::{DiffusionPipeline, InferenceParams, PipelineSpec};
