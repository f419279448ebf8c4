pub mod agents;
pub mod images;
pub mod listings;
pub mod prompts;

pub use agents::{CreateAgentRequest, CreateAgentResponse};
pub use images::{GenerateImageRequest, GenerateImageResponse, UploadImageResponse};
pub use listings::{AvatarListResponse, SessionListResponse, SessionResponse};
pub use prompts::{GeneratePromptRequest, GeneratePromptResponse};
