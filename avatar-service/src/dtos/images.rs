use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateImageRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    /// Appended to the name to form the image prompt.
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_description() -> String {
    "portrait".to_string()
}

impl GenerateImageRequest {
    pub fn prompt(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub message: String,
    pub image_url: String,
    pub avatar_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadImageResponse {
    pub message: String,
    pub image_url: String,
}
