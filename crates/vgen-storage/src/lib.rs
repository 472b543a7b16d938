//! Supabase Storage client.
//!
//! This crate provides:
//! - Upload of finished MP4 files with overwrite-on-conflict semantics
//! - Public URL construction for uploaded objects
//! - The `VideoUploader` seam used by the worker

pub mod client;
pub mod error;

pub use client::{StorageConfig, SupabaseStorage, VideoUploader, DEFAULT_BUCKET, VIDEO_CONTENT_TYPE};
pub use error::{StorageError, StorageResult};
