//! Generative-language provider abstraction.
//!
//! The service needs plain text generation for prompt writing and a file API
//! (upload, poll, generate, delete) for video-grounded prompts.

pub mod gemini;

use async_trait::async_trait;
use serde::Deserialize;
use service_core::error::AppError;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("File {0} failed processing")]
    FileProcessingFailed(String),

    #[error("File {name} not ready after {waited:?}")]
    FileTimeout { name: String, waited: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
}

/// A file held by the provider for use as generation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Upload a local file to the provider's file store.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, ProviderError>;

    /// Fetch the current metadata of an uploaded file.
    async fn get_file(&self, name: &str) -> Result<UploadedFile, ProviderError>;

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError>;

    /// Generate text grounded on an uploaded file.
    async fn generate_with_file(
        &self,
        prompt: &str,
        file: &UploadedFile,
    ) -> Result<String, ProviderError>;
}

/// Poll `file` until the provider reports it `ACTIVE`.
///
/// `FAILED` and exceeding `timeout` are errors.
pub async fn wait_until_active(
    provider: &dyn TextProvider,
    file: UploadedFile,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<UploadedFile, ProviderError> {
    let started = tokio::time::Instant::now();
    let mut current = file;

    loop {
        match current.state {
            FileState::Active => return Ok(current),
            FileState::Failed => return Err(ProviderError::FileProcessingFailed(current.name)),
            FileState::Processing | FileState::StateUnspecified => {}
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(ProviderError::FileTimeout {
                name: current.name,
                waited,
            });
        }

        tracing::debug!(file = %current.name, state = ?current.state, "Waiting for file processing");
        tokio::time::sleep(poll_interval).await;
        current = provider.get_file(&current.name).await?;
    }
}
