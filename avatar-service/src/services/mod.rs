pub mod image_generator;
pub mod metrics;
pub mod providers;
pub mod repository;
pub mod storage;
pub mod voice_agent;

pub use image_generator::{ImageGenerator, PollinationsClient};
pub use metrics::{get_metrics, init_metrics};
pub use providers::gemini::{GeminiConfig, GeminiTextProvider};
pub use providers::{wait_until_active, FileState, ProviderError, TextProvider, UploadedFile};
pub use repository::{AvatarRepository, InMemoryRepository, PgAvatarRepository};
pub use storage::{LocalStorage, Storage, SupabaseStorage};
pub use voice_agent::{AgentSpec, ElevenLabsClient, VoiceAgentClient, VoiceAgentError};
