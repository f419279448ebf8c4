//! Portrait generation through the Pollinations image API.

use crate::services::metrics::record_upstream_call;
use async_trait::async_trait;
use reqwest::Client;
use service_core::error::AppError;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for `prompt`. `seed` varies the output between calls.
    async fn generate(&self, prompt: &str, seed: i64) -> Result<Vec<u8>, AppError>;
}

#[derive(Clone)]
pub struct PollinationsClient {
    client: Client,
    base_url: String,
    width: u32,
    height: u32,
}

impl PollinationsClient {
    pub fn new(client: Client, base_url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            width,
            height,
        }
    }

    fn image_url(&self, prompt: &str, seed: i64) -> String {
        format!(
            "{}/prompt/{}?width={}&height={}&seed={}&nologo=true",
            self.base_url,
            urlencoding::encode(prompt),
            self.width,
            self.height,
            seed
        )
    }
}

#[async_trait]
impl ImageGenerator for PollinationsClient {
    async fn generate(&self, prompt: &str, seed: i64) -> Result<Vec<u8>, AppError> {
        let url = self.image_url(prompt, seed);

        tracing::debug!(prompt_len = prompt.len(), seed = seed, "Requesting generated image");

        let response = self.client.get(&url).send().await.map_err(|e| {
            record_upstream_call("pollinations", "generate_image", false);
            AppError::InternalError(anyhow::anyhow!("Image generation request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            record_upstream_call("pollinations", "generate_image", false);
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Image generation failed with status {}: {}",
                status,
                body
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            record_upstream_call("pollinations", "generate_image", false);
            AppError::InternalError(anyhow::anyhow!("Failed to read generated image: {}", e))
        })?;

        record_upstream_call("pollinations", "generate_image", true);
        Ok(bytes.to_vec())
    }
}
