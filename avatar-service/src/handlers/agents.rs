use crate::dtos::{CreateAgentRequest, CreateAgentResponse};
use crate::models::NewAvatar;
use crate::services::AgentSpec;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

/// Register the voice agent, then persist the avatar.
#[tracing::instrument(skip(state, request), fields(avatar_name = %request.name))]
pub async fn create_agent(
    State(state): State<AppState>,
    Json(request): Json<CreateAgentRequest>,
) -> Result<Json<CreateAgentResponse>, AppError> {
    request.validate()?;

    let spec = AgentSpec {
        name: request.name.clone(),
        system_prompt: request.system_prompt.clone(),
        first_message: request.first_message.clone(),
        language: request.language.clone(),
        voice_id: request.voice_id.clone(),
        model_id: request.model_id.clone(),
    };
    let agent_id = state.voice_agent.create_agent(&spec).await?;

    let record = state
        .repository
        .insert_avatar(NewAvatar {
            name: request.name,
            image_url: request.image_url,
            system_prompt: request.system_prompt,
            agent_id: agent_id.clone(),
            voice_id: request.voice_id,
            language: request.language,
            first_message: request.first_message,
        })
        .await?;

    tracing::info!(avatar_id = %record.id, agent_id = ?agent_id, "Avatar created");

    Ok(Json(CreateAgentResponse {
        message: "Avatar created successfully!".to_string(),
        agent_id,
        db_record: Some(record),
    }))
}
