use super::multipart_error;
use crate::dtos::{GenerateImageRequest, GenerateImageResponse, UploadImageResponse};
use crate::startup::AppState;
use crate::utils::{generated_image_key, unix_timestamp, uploaded_image_key};
use axum::{
    extract::{Multipart, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

const GENERATED_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Generate a portrait for the avatar and store it.
#[tracing::instrument(skip(state, request), fields(avatar_name = %request.name))]
pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, AppError> {
    request.validate()?;

    let timestamp = unix_timestamp();
    let image = state
        .image_generator
        .generate(&request.prompt(), timestamp)
        .await?;

    let key = generated_image_key(&request.name, timestamp);
    state
        .storage
        .upload(&key, image, GENERATED_IMAGE_CONTENT_TYPE)
        .await?;

    let image_url = state.storage.public_url(&key);
    tracing::info!(key = %key, "Generated avatar image stored");

    Ok(Json(GenerateImageResponse {
        message: "Image generated successfully".to_string(),
        image_url,
        avatar_name: request.name,
    }))
}

/// Store a client-supplied avatar image.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_avatar_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadImageResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    let key = uploaded_image_key(field.file_name(), unix_timestamp());
    let content_type = field
        .content_type()
        .unwrap_or(GENERATED_IMAGE_CONTENT_TYPE)
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(multipart_error)?
        .to_vec();

    let size = data.len();
    state.storage.upload(&key, data, &content_type).await?;

    tracing::info!(key = %key, size = size, content_type = %content_type, "Avatar image uploaded");

    Ok(Json(UploadImageResponse {
        message: "Image uploaded successfully".to_string(),
        image_url: state.storage.public_url(&key),
    }))
}
