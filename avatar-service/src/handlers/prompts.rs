use super::multipart_error;
use crate::dtos::{GeneratePromptRequest, GeneratePromptResponse};
use crate::services::{wait_until_active, ProviderError, TextProvider};
use crate::startup::AppState;
use axum::extract::multipart::Field;
use axum::{
    extract::{Multipart, State},
    Json,
};
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_VIDEO_MIME_TYPE: &str = "video/mp4";

const VIDEO_META_PROMPT: &str = "You are an expert at creating system prompts for conversational AI agents.
Task: Watch this video and create a concise, engaging system prompt for an AI agent that embodies the person shown.
Capture their personality, speaking style and the topics they are knowledgeable about.
The prompt should define the agent's persona, capabilities, and behavioral constraints.
Generated System Prompt:";

fn knowledge_meta_prompt(knowledge_base: &str) -> String {
    format!(
        "You are an expert at creating system prompts for conversational AI agents.
Task: Create a concise, engaging system prompt for an AI agent based on this knowledge description:
\"{}\"
The prompt should define the agent's persona, capabilities, and behavioral constraints.
Generated System Prompt:",
        knowledge_base
    )
}

/// Write a system prompt from a free-text knowledge description.
#[tracing::instrument(skip(state, request))]
pub async fn generate_prompt(
    State(state): State<AppState>,
    Json(request): Json<GeneratePromptRequest>,
) -> Result<Json<GeneratePromptResponse>, AppError> {
    request.validate()?;

    let system_prompt = state
        .text_provider
        .generate(&knowledge_meta_prompt(&request.knowledge_base))
        .await?;

    tracing::info!(prompt_len = system_prompt.len(), "System prompt generated");

    Ok(Json(GeneratePromptResponse {
        message: "System prompt generated".to_string(),
        system_prompt,
    }))
}

/// Write a system prompt from an uploaded video.
///
/// The upload is staged on disk, handed to the file API, polled until active
/// and then used as generation input. The staged file and the remote file are
/// removed whatever the outcome.
#[tracing::instrument(skip(state, multipart))]
pub async fn generate_prompt_from_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GeneratePromptResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No video uploaded")))?;

    let display_name = field.file_name().unwrap_or("video").to_string();
    let mime_type = field
        .content_type()
        .unwrap_or(DEFAULT_VIDEO_MIME_TYPE)
        .to_string();
    let staging_path = staging_path(&state.config.upload.staging_dir, &display_name);

    let result: Result<String, AppError> = async {
        let size = stage_upload(field, &staging_path).await?;
        tracing::info!(
            path = %staging_path.display(),
            size = size,
            mime_type = %mime_type,
            "Video staged"
        );
        prompt_from_video(&state, &staging_path, &mime_type, &display_name).await
    }
    .await;

    if let Err(e) = tokio::fs::remove_file(&staging_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %staging_path.display(), error = %e, "Failed to remove staged video");
        }
    }

    let system_prompt = result?;

    Ok(Json(GeneratePromptResponse {
        message: "System prompt generated from video".to_string(),
        system_prompt,
    }))
}

fn staging_path(dir: &Path, display_name: &str) -> PathBuf {
    let extension = Path::new(display_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    dir.join(format!("avatar-video-{}{}", Uuid::new_v4(), extension))
}

/// Stream a multipart field to `path`, returning the bytes written.
async fn stage_upload(mut field: Field<'_>, path: &Path) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

async fn prompt_from_video(
    state: &AppState,
    path: &Path,
    mime_type: &str,
    display_name: &str,
) -> Result<String, AppError> {
    let provider: &dyn TextProvider = state.text_provider.as_ref();
    let uploaded = provider.upload_file(path, mime_type, display_name).await?;
    let remote_name = uploaded.name.clone();

    let gemini = &state.config.gemini;
    let outcome: Result<String, ProviderError> = async {
        let ready = wait_until_active(
            provider,
            uploaded,
            Duration::from_millis(gemini.file_poll_interval_ms),
            Duration::from_secs(gemini.file_poll_timeout_secs),
        )
        .await?;
        provider.generate_with_file(VIDEO_META_PROMPT, &ready).await
    }
    .await;

    if let Err(e) = provider.delete_file(&remote_name).await {
        tracing::warn!(file = %remote_name, error = %e, "Failed to delete uploaded video");
    }

    Ok(outcome?)
}
