use crate::models::{AvatarListing, SessionWithAvatar};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarListResponse {
    pub message: String,
    pub count: usize,
    pub avatars: Vec<AvatarListing>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub message: String,
    pub count: usize,
    pub sessions: Vec<SessionWithAvatar>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub session: SessionWithAvatar,
}
