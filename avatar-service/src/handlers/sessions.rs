use crate::dtos::{SessionListResponse, SessionResponse};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

#[tracing::instrument(skip(state))]
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.repository.list_sessions().await?;

    Ok(Json(SessionListResponse {
        message: "Sessions fetched successfully".to_string(),
        count: sessions.len(),
        sessions,
    }))
}

/// Ids that do not parse as UUIDs cannot name a session and are reported
/// as not found.
#[tracing::instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let not_found = || AppError::NotFound(anyhow::anyhow!("Session not found"));

    let id = Uuid::parse_str(&session_id).map_err(|_| not_found())?;
    let session = state.repository.get_session(id).await?.ok_or_else(not_found)?;

    Ok(Json(SessionResponse {
        message: "Session fetched successfully".to_string(),
        session,
    }))
}
