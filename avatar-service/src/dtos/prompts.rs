use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratePromptRequest {
    /// Free-form description of what the agent should know and how it behaves.
    #[validate(length(min = 1, message = "Knowledge base cannot be empty"))]
    pub knowledge_base: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratePromptResponse {
    pub message: String,
    pub system_prompt: String,
}
