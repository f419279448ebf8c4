//! Session model: a recorded conversation with an avatar.
//!
//! Sessions are written by other parts of the product; this service only
//! reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Avatar summary joined onto a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionAvatar {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}

/// A session row with its avatar summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionWithAvatar {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub avatar_id: Option<Uuid>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    /// Emotion-analysis output, stored as opaque JSON.
    pub emotion_report: Option<serde_json::Value>,
    /// Keyed `avatars` to match the join shape clients consume.
    pub avatars: Option<SessionAvatar>,
}
