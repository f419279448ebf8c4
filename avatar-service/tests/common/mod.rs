#![allow(dead_code)]

use avatar_service::config::{
    AvatarConfig, CorsConfig, DatabaseConfig, ElevenLabsConfig, GeminiSettings, ImageConfig,
    StorageBackend, StorageConfig, UploadConfig,
};
use avatar_service::models::Avatar;
use avatar_service::services::repository::memory::StoredSession;
use avatar_service::services::{AvatarRepository, InMemoryRepository};
use avatar_service::startup::{AppState, Application};
use chrono::{DateTime, Utc};
use secrecy::Secret;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::MockServer;

pub const TEST_GOOGLE_KEY: &str = "test-google-key";
pub const TEST_ELEVENLABS_KEY: &str = "test-elevenlabs-key";
pub const TEST_SUPABASE_KEY: &str = "test-service-key";
pub const TEST_MODEL: &str = "gemini-test";
pub const TEST_BUCKET: &str = "avatar-images";

/// A running avatar-service wired to mock upstreams.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub repository: InMemoryRepository,
    pub image_server: MockServer,
    pub gemini_server: MockServer,
    pub elevenlabs_server: MockServer,
    pub storage_server: MockServer,
    pub storage_dir: TempDir,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a hook to adjust the configuration before startup.
    pub async fn spawn_with(configure: impl FnOnce(&mut AvatarConfig)) -> Self {
        Self::spawn_inner(configure, None).await
    }

    /// Spawn with a custom repository in place of the in-memory one.
    pub async fn spawn_with_repository(repository: Arc<dyn AvatarRepository>) -> Self {
        Self::spawn_inner(|_| {}, Some(repository)).await
    }

    async fn spawn_inner(
        configure: impl FnOnce(&mut AvatarConfig),
        repository_override: Option<Arc<dyn AvatarRepository>>,
    ) -> Self {
        let image_server = MockServer::start().await;
        let gemini_server = MockServer::start().await;
        let elevenlabs_server = MockServer::start().await;
        let storage_server = MockServer::start().await;
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
        let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");

        let mut config = AvatarConfig {
            common: service_core::config::Config {
                port: 0,
                log_level: "debug".to_string(),
            },
            image: ImageConfig {
                api_base_url: image_server.uri(),
                width: 512,
                height: 512,
            },
            gemini: GeminiSettings {
                api_base_url: gemini_server.uri(),
                api_key: Secret::new(TEST_GOOGLE_KEY.to_string()),
                model: TEST_MODEL.to_string(),
                file_poll_interval_ms: 10,
                file_poll_timeout_secs: 5,
            },
            elevenlabs: ElevenLabsConfig {
                api_base_url: elevenlabs_server.uri(),
                api_key: Secret::new(TEST_ELEVENLABS_KEY.to_string()),
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                bucket: TEST_BUCKET.to_string(),
                supabase_url: Some(storage_server.uri()),
                supabase_service_key: Some(Secret::new(TEST_SUPABASE_KEY.to_string())),
                local_path: storage_dir.path().to_string_lossy().into_owned(),
                public_base_url: "http://localhost/media".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
                run_migrations: false,
            },
            upload: UploadConfig {
                max_bytes: 10 * 1024 * 1024,
                staging_dir: staging_dir.path().to_path_buf(),
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
            otlp_endpoint: None,
        };
        configure(&mut config);

        let repository = InMemoryRepository::new();
        let mut state = AppState::from_config(&config)
            .await
            .expect("Failed to build application state");
        state.repository = repository_override.unwrap_or_else(|| Arc::new(repository.clone()));

        let app = Application::build_with_state(config, state)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: reqwest::Client::new(),
            repository,
            image_server,
            gemini_server,
            elevenlabs_server,
            storage_server,
            storage_dir,
            staging_dir,
        }
    }

    /// Files left behind in the upload staging directory.
    pub fn staged_files(&self) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(self.staging_dir.path())
            .expect("Failed to read staging dir")
            .map(|entry| entry.expect("Failed to read staging entry").path())
            .collect()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_file(
        &self,
        path: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> reqwest::Response {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(data)
                .file_name(file_name.to_string())
                .mime_str(mime_type)
                .unwrap(),
        );

        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn seed_avatar(&self, name: &str, image_url: Option<&str>) -> Avatar {
        let avatar = Avatar {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: image_url.map(str::to_string),
            system_prompt: format!("You are {}.", name),
            agent_id: Some(format!("agent_{}", name.to_lowercase())),
            voice_id: "voice_1".to_string(),
            language: "en".to_string(),
            first_message: "Hello, how can I help you?".to_string(),
            created_at: Utc::now(),
        };
        self.repository.insert_avatar_row(avatar.clone()).await;
        avatar
    }

    pub async fn seed_session(&self, avatar_id: Option<Uuid>, created_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.repository
            .insert_session(StoredSession {
                id,
                created_at,
                avatar_id,
                video_url: Some(format!("https://cdn.example.com/{}.mp4", id)),
                audio_url: None,
                emotion_report: Some(serde_json::json!({ "dominant": "joy" })),
            })
            .await;
        id
    }
}
