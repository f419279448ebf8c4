//! Object storage for avatar images.

use crate::services::metrics::record_upstream_call;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    /// Publicly reachable URL for a stored object.
    fn public_url(&self, key: &str) -> String;
}

/// Filesystem storage, served by the router under `/media`.
pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

/// Keys are flat file names; anything that would resolve outside the
/// storage root is refused.
fn ensure_flat_key(key: &str) -> Result<(), AppError> {
    let mut components = Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !key.contains('\\') => Ok(()),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid storage key: {}",
            key
        ))),
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<(), AppError> {
        ensure_flat_key(key)?;
        fs::write(self.base_path.join(key), data).await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, urlencoding::encode(key))
    }
}

/// Supabase Storage bucket accessed through its REST API.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: Secret<String>,
}

impl SupabaseStorage {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: Secret<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key,
        }
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        );
        let size = data.len();

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.service_key.expose_secret())
            .header("apikey", self.service_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                record_upstream_call("supabase_storage", "upload", false);
                AppError::InternalError(anyhow::anyhow!("Storage upload failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            record_upstream_call("supabase_storage", "upload", false);
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Storage upload failed with status {}: {}",
                status,
                body
            )));
        }

        record_upstream_call("supabase_storage", "upload", true);
        tracing::info!(bucket = %self.bucket, key = %key, size = size, "Object uploaded");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        )
    }
}
