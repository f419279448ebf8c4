//! Gemini AI provider implementation.
//!
//! Text generation through `generateContent` and media input through the
//! Gemini File API (resumable upload, metadata polling, delete).

use super::{FileState, ProviderError, TextProvider, UploadedFile};
use crate::services::metrics::record_upstream_call;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com`.
    pub api_base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig, client: Client) -> Self {
        let config = GeminiConfig {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            ..config
        };
        Self { config, client }
    }

    /// Build the API URL for the given model and method.
    fn model_url(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.api_base_url, self.config.model, method
        )
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.config.api_base_url, name)
    }

    /// Attach the API key as a header so it never appears in request URLs.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.config.api_key.expose_secret())
    }

    async fn generate_content(
        &self,
        parts: Vec<ContentPart>,
        operation: &'static str,
    ) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        };

        tracing::debug!(model = %self.config.model, "Sending request to Gemini API");

        let response = self
            .authorized(self.client.post(self.model_url("generateContent")))
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(operation, e))?;

        let response = ensure_success(response, operation).await?;

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            record_upstream_call("gemini", operation, false);
            ProviderError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        record_upstream_call("gemini", operation, true);
        api_response.into_text()
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate_content(
            vec![ContentPart::Text {
                text: prompt.to_string(),
            }],
            "generate",
        )
        .await
    }

    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, ProviderError> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();

        // Resumable protocol: the start call returns the session URL for the bytes.
        let start_url = format!("{}/upload/v1beta/files", self.config.api_base_url);
        let start = self
            .authorized(self.client.post(&start_url))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: FileMetadata {
                    display_name: display_name.to_string(),
                },
            })
            .send()
            .await
            .map_err(|e| network_error("upload_file", e))?;

        let start = ensure_success(start, "upload_file").await?;
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                record_upstream_call("gemini", "upload_file", false);
                ProviderError::ApiError("Upload session URL missing from response".to_string())
            })?;

        tracing::info!(size = size, mime_type = %mime_type, "Uploading file to Gemini");

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let finalize = self
            .client
            .post(&upload_url)
            .header(header::CONTENT_LENGTH, size)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(body)
            .send()
            .await
            .map_err(|e| network_error("upload_file", e))?;

        let finalize = ensure_success(finalize, "upload_file").await?;
        let uploaded: FileEnvelope = finalize.json().await.map_err(|e| {
            record_upstream_call("gemini", "upload_file", false);
            ProviderError::ApiError(format!("Failed to parse upload response: {}", e))
        })?;

        record_upstream_call("gemini", "upload_file", true);
        tracing::info!(file = %uploaded.file.name, "File uploaded to Gemini");

        Ok(uploaded.file.into())
    }

    async fn get_file(&self, name: &str) -> Result<UploadedFile, ProviderError> {
        let response = self
            .authorized(self.client.get(self.file_url(name)))
            .send()
            .await
            .map_err(|e| network_error("get_file", e))?;

        let response = ensure_success(response, "get_file").await?;
        let file: ApiFile = response.json().await.map_err(|e| {
            record_upstream_call("gemini", "get_file", false);
            ProviderError::ApiError(format!("Failed to parse file metadata: {}", e))
        })?;

        record_upstream_call("gemini", "get_file", true);
        Ok(file.into())
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        let response = self
            .authorized(self.client.delete(self.file_url(name)))
            .send()
            .await
            .map_err(|e| network_error("delete_file", e))?;

        ensure_success(response, "delete_file").await?;
        record_upstream_call("gemini", "delete_file", true);
        tracing::debug!(file = %name, "Deleted Gemini file");
        Ok(())
    }

    async fn generate_with_file(
        &self,
        prompt: &str,
        file: &UploadedFile,
    ) -> Result<String, ProviderError> {
        self.generate_content(
            vec![
                ContentPart::FileData {
                    file_data: FileData {
                        mime_type: file.mime_type.clone(),
                        file_uri: file.uri.clone(),
                    },
                },
                ContentPart::Text {
                    text: prompt.to_string(),
                },
            ],
            "generate_with_file",
        )
        .await
    }
}

/// Transport failures carry the request URL, which is stripped before the
/// message reaches logs or response bodies.
fn network_error(operation: &'static str, err: reqwest::Error) -> ProviderError {
    record_upstream_call("gemini", operation, false);
    ProviderError::NetworkError(err.without_url().to_string())
}

/// Map non-success statuses onto provider errors.
async fn ensure_success(
    response: Response,
    operation: &'static str,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    record_upstream_call("gemini", operation, false);
    let error_text = response.text().await.unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }

    Err(ProviderError::ApiError(format!(
        "Gemini API error {}: {}",
        status, error_text
    )))
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, ProviderError> {
        if self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return Err(ProviderError::ContentFiltered);
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::ContentFiltered);
        }

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct StartUploadRequest {
    file: FileMetadata,
}

#[derive(Debug, Serialize)]
struct FileMetadata {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: ApiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: FileState,
}

impl From<ApiFile> for UploadedFile {
    fn from(file: ApiFile) -> Self {
        Self {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
            state: file.state,
        }
    }
}
