//! Persistence of avatars and read access to recorded sessions.

pub mod memory;
pub mod postgres;

use crate::models::{Avatar, AvatarListing, NewAvatar, SessionWithAvatar};
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

pub use memory::InMemoryRepository;
pub use postgres::PgAvatarRepository;

#[async_trait]
pub trait AvatarRepository: Send + Sync {
    /// Insert an avatar and return the stored row.
    async fn insert_avatar(&self, avatar: NewAvatar) -> Result<Avatar, AppError>;

    /// All avatars, as stored (no placeholder substitution).
    async fn list_avatars(&self) -> Result<Vec<AvatarListing>, AppError>;

    /// All sessions with their avatar summary, newest first.
    async fn list_sessions(&self) -> Result<Vec<SessionWithAvatar>, AppError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionWithAvatar>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
