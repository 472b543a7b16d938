//! Supabase Storage client implementation.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, info};
use vgen_models::UploadResult;

use crate::error::{StorageError, StorageResult};

/// Bucket used when `SUPABASE_BUCKET` is not set.
pub const DEFAULT_BUCKET: &str = "files";
/// Content type sent with every upload.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

const MISSING_CONFIG: &str =
    "Supabase config missing. Set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY env vars.";

/// Configuration for the storage client.
///
/// Endpoint and key stay optional so a worker can start without them; the
/// upload itself fails when either is missing.
#[derive(Clone)]
pub struct StorageConfig {
    /// Project URL, without trailing slash
    pub endpoint: Option<String>,
    /// Service-role key sent as bearer token
    pub service_key: Option<String>,
    /// Bucket name
    pub bucket: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl StorageConfig {
    pub fn new(
        endpoint: Option<String>,
        service_key: Option<String>,
        bucket: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty());
        let service_key = service_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let bucket = bucket.into();
        let bucket = if bucket.trim().is_empty() {
            DEFAULT_BUCKET.to_string()
        } else {
            bucket.trim().to_string()
        };

        Self {
            endpoint,
            service_key,
            bucket,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup("SUPABASE_URL"),
            lookup("SUPABASE_SERVICE_ROLE_KEY"),
            lookup("SUPABASE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        )
    }

    pub fn is_complete(&self) -> bool {
        self.endpoint.is_some() && self.service_key.is_some()
    }

    fn credentials(&self) -> StorageResult<(&str, &str)> {
        match (self.endpoint.as_deref(), self.service_key.as_deref()) {
            (Some(endpoint), Some(key)) => Ok((endpoint, key)),
            _ => Err(StorageError::config_error(MISSING_CONFIG)),
        }
    }
}

/// Uploads finished videos and returns their public URL.
#[async_trait]
pub trait VideoUploader: Send + Sync {
    async fn upload(&self, path: &Path, file_name: &str) -> StorageResult<UploadResult>;
}

/// Supabase Storage client.
#[derive(Clone)]
pub struct SupabaseStorage {
    http: Client,
    config: StorageConfig,
}

impl SupabaseStorage {
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env())
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Object endpoint the file is written to.
    pub fn upload_url(&self, file_name: &str) -> StorageResult<String> {
        let (endpoint, _) = self.config.credentials()?;
        Ok(format!(
            "{}/storage/v1/object/{}/{}",
            endpoint, self.config.bucket, file_name
        ))
    }

    /// Public URL of an uploaded object.
    pub fn public_url(&self, file_name: &str) -> StorageResult<String> {
        let (endpoint, _) = self.config.credentials()?;
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            endpoint, self.config.bucket, file_name
        ))
    }

    /// Upload a local MP4 as `file_name`, overwriting any existing object.
    pub async fn upload_file(&self, path: &Path, file_name: &str) -> StorageResult<UploadResult> {
        let (_, key) = self.config.credentials()?;
        let url = self.upload_url(file_name)?;

        let bytes = tokio::fs::read(path).await?;
        debug!(
            "Uploading {} ({} bytes) to {}",
            path.display(),
            bytes.len(),
            url
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, VIDEO_CONTENT_TYPE)
            .header(AUTHORIZATION, format!("Bearer {}", key))
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::upload_failed(status.as_u16(), body));
        }

        let public_url = self.public_url(file_name)?;
        info!("Uploaded {} to {}", path.display(), public_url);
        Ok(UploadResult { public_url })
    }
}

#[async_trait]
impl VideoUploader for SupabaseStorage {
    async fn upload(&self, path: &Path, file_name: &str) -> StorageResult<UploadResult> {
        self.upload_file(path, file_name).await
    }
}
