use crate::models::Avatar;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAgentRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    pub image_url: Option<String>,
    #[validate(length(min = 1, message = "System prompt cannot be empty"))]
    pub system_prompt: String,
    #[validate(length(min = 1, message = "Voice ID cannot be empty"))]
    pub voice_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_first_message")]
    pub first_message: String,
    /// Text-to-speech model used by the voice platform.
    #[serde(default = "default_model_id")]
    pub model_id: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_first_message() -> String {
    "Hello, how can I help you?".to_string()
}

fn default_model_id() -> String {
    "eleven_turbo_v2_5".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAgentResponse {
    pub message: String,
    pub agent_id: Option<String>,
    pub db_record: Option<Avatar>,
}
