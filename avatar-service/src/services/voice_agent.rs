//! Conversational voice-agent registration with ElevenLabs.
//!
//! Implements the ConvAI "create agent" call. Non-success answers keep their
//! status code so the handler can pass it through to the caller.

use crate::services::metrics::record_upstream_call;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceAgentError {
    /// The platform answered with a non-success status.
    #[error("ElevenLabs Error: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// API rejections keep the platform's status code; everything else is a 500.
impl From<VoiceAgentError> for AppError {
    fn from(err: VoiceAgentError) -> Self {
        if let VoiceAgentError::Api { status, .. } = &err {
            return AppError::Upstream {
                status: *status,
                message: err.to_string(),
            };
        }
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Everything needed to register an agent.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub system_prompt: String,
    pub first_message: String,
    pub language: String,
    pub voice_id: String,
    pub model_id: String,
}

#[async_trait]
pub trait VoiceAgentClient: Send + Sync {
    /// Register an agent and return its identifier.
    async fn create_agent(&self, spec: &AgentSpec) -> Result<Option<String>, VoiceAgentError>;
}

#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl ElevenLabsClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl VoiceAgentClient for ElevenLabsClient {
    async fn create_agent(&self, spec: &AgentSpec) -> Result<Option<String>, VoiceAgentError> {
        let url = format!("{}/v1/convai/agents/create", self.base_url);
        let payload = CreateAgentRequest::from(spec);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                record_upstream_call("elevenlabs", "create_agent", false);
                VoiceAgentError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VoiceAgentError::Network(e.to_string()))?;

        tracing::debug!(status = %status, "ElevenLabs create_agent response");

        if !status.is_success() {
            record_upstream_call("elevenlabs", "create_agent", false);
            tracing::error!(status = %status, body = %body, "ElevenLabs agent creation failed");
            return Err(VoiceAgentError::Api { status, body });
        }

        let created: CreateAgentResponse = serde_json::from_str(&body)
            .map_err(|e| VoiceAgentError::InvalidResponse(e.to_string()))?;

        record_upstream_call("elevenlabs", "create_agent", true);
        tracing::info!(agent_id = ?created.agent_id, name = %spec.name, "Voice agent registered");

        Ok(created.agent_id)
    }
}

// ============================================================================
// ElevenLabs API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateAgentRequest {
    name: String,
    conversation_config: ConversationConfig,
}

#[derive(Debug, Serialize)]
struct ConversationConfig {
    agent: AgentConfig,
    tts: TtsConfig,
}

#[derive(Debug, Serialize)]
struct AgentConfig {
    prompt: PromptConfig,
    first_message: String,
    language: String,
}

#[derive(Debug, Serialize)]
struct PromptConfig {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct TtsConfig {
    voice_id: String,
    model_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateAgentResponse {
    #[serde(default)]
    agent_id: Option<String>,
}

impl From<&AgentSpec> for CreateAgentRequest {
    fn from(spec: &AgentSpec) -> Self {
        Self {
            name: spec.name.clone(),
            conversation_config: ConversationConfig {
                agent: AgentConfig {
                    prompt: PromptConfig {
                        prompt: spec.system_prompt.clone(),
                    },
                    first_message: spec.first_message.clone(),
                    language: spec.language.clone(),
                },
                tts: TtsConfig {
                    voice_id: spec.voice_id.clone(),
                    model_id: spec.model_id.clone(),
                },
            },
        }
    }
}
