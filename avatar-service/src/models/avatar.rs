//! Avatar model: a named persona with an image, system prompt and voice agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Shown by clients for avatars stored without an image.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://via.placeholder.com/512x512/E0F2FE/1E293B?text=Avatar";

/// A persisted avatar row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Avatar {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub system_prompt: String,
    /// Identifier of the agent registered with the voice platform.
    pub agent_id: Option<String>,
    pub voice_id: String,
    pub language: String,
    pub first_message: String,
    pub created_at: DateTime<Utc>,
}

/// Values for a new avatar row; identity and timestamp come from the store.
#[derive(Debug, Clone)]
pub struct NewAvatar {
    pub name: String,
    pub image_url: Option<String>,
    pub system_prompt: String,
    pub agent_id: Option<String>,
    pub voice_id: String,
    pub language: String,
    pub first_message: String,
}

/// Projection used by the avatar gallery.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct AvatarListing {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub agent_id: Option<String>,
    pub system_prompt: String,
}

impl AvatarListing {
    /// Replace a missing or blank image URL with the placeholder.
    pub fn with_placeholder_image(mut self) -> Self {
        let missing = self
            .image_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty());
        if missing {
            self.image_url = Some(PLACEHOLDER_IMAGE_URL.to_string());
        }
        self
    }
}

impl From<&Avatar> for AvatarListing {
    fn from(avatar: &Avatar) -> Self {
        Self {
            id: avatar.id,
            name: avatar.name.clone(),
            image_url: avatar.image_url.clone(),
            agent_id: avatar.agent_id.clone(),
            system_prompt: avatar.system_prompt.clone(),
        }
    }
}
