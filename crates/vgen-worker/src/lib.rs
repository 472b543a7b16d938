//! Serverless video generation worker.
//!
//! Takes generation jobs from the hosting runtime, renders them with the
//! SkyReels-V2 pipelines, upscales, uploads and reports a public URL.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod generation;
pub mod handler;
pub mod logging;
pub mod metrics;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{RuntimeConfig, WorkerConfig};
pub use context::AppContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::{load_test_input, run_local, JobExecutor};
pub use handler::{handle_job, upload_file_name};
pub use logging::JobLogger;
