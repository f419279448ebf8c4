//! PostgreSQL repository (works against a Supabase project's database).

use super::AvatarRepository;
use crate::models::{Avatar, AvatarListing, NewAvatar, SessionAvatar, SessionWithAvatar};
use crate::services::metrics::record_db_query;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

const SESSION_COLUMNS: &str = r#"
    s.id, s.created_at, s.avatar_id, s.video_url, s.audio_url, s.emotion_report,
    a.id AS joined_avatar_id, a.name AS avatar_name, a.image_url AS avatar_image_url
"#;

#[derive(Clone)]
pub struct PgAvatarRepository {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    avatar_id: Option<Uuid>,
    video_url: Option<String>,
    audio_url: Option<String>,
    emotion_report: Option<serde_json::Value>,
    joined_avatar_id: Option<Uuid>,
    avatar_name: Option<String>,
    avatar_image_url: Option<String>,
}

impl From<SessionRow> for SessionWithAvatar {
    fn from(row: SessionRow) -> Self {
        let avatars = match (row.joined_avatar_id, row.avatar_name) {
            (Some(id), Some(name)) => Some(SessionAvatar {
                id,
                name,
                image_url: row.avatar_image_url,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            created_at: row.created_at,
            avatar_id: row.avatar_id,
            video_url: row.video_url,
            audio_url: row.audio_url,
            emotion_report: row.emotion_report,
            avatars,
        }
    }
}

impl PgAvatarRepository {
    /// Create a new connection pool.
    #[instrument(skip(database_url), fields(service = "avatar-service"))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections = max_connections, "Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl AvatarRepository for PgAvatarRepository {
    #[instrument(skip(self, avatar), fields(name = %avatar.name))]
    async fn insert_avatar(&self, avatar: NewAvatar) -> Result<Avatar, AppError> {
        let started = Instant::now();

        let row = sqlx::query_as::<_, Avatar>(
            r#"
            INSERT INTO avatars (name, image_url, system_prompt, agent_id, voice_id, language, first_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, image_url, system_prompt, agent_id, voice_id, language, first_message, created_at
            "#,
        )
        .bind(&avatar.name)
        .bind(&avatar.image_url)
        .bind(&avatar.system_prompt)
        .bind(&avatar.agent_id)
        .bind(&avatar.voice_id)
        .bind(&avatar.language)
        .bind(&avatar.first_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert avatar: {}", e)))?;

        record_db_query("insert_avatar", started.elapsed());
        info!(avatar_id = %row.id, "Avatar stored");

        Ok(row)
    }

    #[instrument(skip(self))]
    async fn list_avatars(&self) -> Result<Vec<AvatarListing>, AppError> {
        let started = Instant::now();

        let avatars = sqlx::query_as::<_, AvatarListing>(
            r#"
            SELECT id, name, image_url, agent_id, system_prompt
            FROM avatars
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list avatars: {}", e)))?;

        record_db_query("list_avatars", started.elapsed());
        Ok(avatars)
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self) -> Result<Vec<SessionWithAvatar>, AppError> {
        let started = Instant::now();

        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions s
            LEFT JOIN avatars a ON a.id = s.avatar_id
            ORDER BY s.created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sessions: {}", e)))?;

        record_db_query("list_sessions", started.elapsed());
        Ok(rows.into_iter().map(SessionWithAvatar::from).collect())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn get_session(&self, id: Uuid) -> Result<Option<SessionWithAvatar>, AppError> {
        let started = Instant::now();

        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions s
            LEFT JOIN avatars a ON a.id = s.avatar_id
            WHERE s.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get session: {}", e)))?;

        record_db_query("get_session", started.elapsed());
        Ok(row.map(SessionWithAvatar::from))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
