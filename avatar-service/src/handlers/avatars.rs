use crate::dtos::AvatarListResponse;
use crate::models::AvatarListing;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

#[tracing::instrument(skip(state))]
pub async fn list_avatars(
    State(state): State<AppState>,
) -> Result<Json<AvatarListResponse>, AppError> {
    let avatars: Vec<AvatarListing> = state
        .repository
        .list_avatars()
        .await?
        .into_iter()
        .map(AvatarListing::with_placeholder_image)
        .collect();

    Ok(Json(AvatarListResponse {
        message: "Avatars fetched successfully".to_string(),
        count: avatars.len(),
        avatars,
    }))
}
