pub mod agents;
pub mod avatars;
pub mod health;
pub mod images;
pub mod prompts;
pub mod sessions;

pub use agents::create_agent;
pub use avatars::list_avatars;
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use images::{generate_image, upload_avatar_image};
pub use prompts::{generate_prompt, generate_prompt_from_video};
pub use sessions::{get_session, list_sessions};

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use service_core::error::AppError;

/// Body-limit rejections keep their 413; anything else is a malformed request.
pub(crate) fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(anyhow::anyhow!("{}", err.body_text()))
    } else {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart data: {}", err))
    }
}
