//! In-process repository used when no database is configured (local
//! development) and by the integration tests.

use super::AvatarRepository;
use crate::models::{Avatar, AvatarListing, NewAvatar, SessionAvatar, SessionWithAvatar};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A session as stored, before joining the avatar summary.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub avatar_id: Option<Uuid>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub emotion_report: Option<serde_json::Value>,
}

#[derive(Default)]
struct Tables {
    avatars: Vec<Avatar>,
    sessions: Vec<StoredSession>,
}

#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session row. Sessions are created elsewhere in production.
    pub async fn insert_session(&self, session: StoredSession) {
        self.tables.write().await.sessions.push(session);
    }

    /// Seed an avatar row directly, bypassing agent registration.
    pub async fn insert_avatar_row(&self, avatar: Avatar) {
        self.tables.write().await.avatars.push(avatar);
    }

    pub async fn avatars(&self) -> Vec<Avatar> {
        self.tables.read().await.avatars.clone()
    }
}

fn join(session: &StoredSession, avatars: &[Avatar]) -> SessionWithAvatar {
    let summary = session.avatar_id.and_then(|avatar_id| {
        avatars
            .iter()
            .find(|a| a.id == avatar_id)
            .map(|a| SessionAvatar {
                id: a.id,
                name: a.name.clone(),
                image_url: a.image_url.clone(),
            })
    });

    SessionWithAvatar {
        id: session.id,
        created_at: session.created_at,
        avatar_id: session.avatar_id,
        video_url: session.video_url.clone(),
        audio_url: session.audio_url.clone(),
        emotion_report: session.emotion_report.clone(),
        avatars: summary,
    }
}

#[async_trait]
impl AvatarRepository for InMemoryRepository {
    async fn insert_avatar(&self, avatar: NewAvatar) -> Result<Avatar, AppError> {
        let row = Avatar {
            id: Uuid::new_v4(),
            name: avatar.name,
            image_url: avatar.image_url,
            system_prompt: avatar.system_prompt,
            agent_id: avatar.agent_id,
            voice_id: avatar.voice_id,
            language: avatar.language,
            first_message: avatar.first_message,
            created_at: Utc::now(),
        };
        self.tables.write().await.avatars.push(row.clone());
        Ok(row)
    }

    async fn list_avatars(&self) -> Result<Vec<AvatarListing>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.avatars.iter().map(AvatarListing::from).collect())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionWithAvatar>, AppError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<SessionWithAvatar> = tables
            .sessions
            .iter()
            .map(|s| join(s, &tables.avatars))
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionWithAvatar>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| join(s, &tables.avatars)))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
