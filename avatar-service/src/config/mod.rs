use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_env_parsed, get_optional_env};
use service_core::error::AppError;
use std::path::PathBuf;

/// Default upload ceiling for images and videos (100 MiB).
const DEFAULT_UPLOAD_MAX_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AvatarConfig {
    pub common: core_config::Config,
    pub image: ImageConfig,
    pub gemini: GeminiSettings,
    pub elevenlabs: ElevenLabsConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub cors: CorsConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub api_base_url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub file_poll_interval_ms: u64,
    pub file_poll_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_base_url: String,
    pub api_key: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<Secret<String>>,
    pub local_path: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string. Unset outside production means the
    /// in-memory repository is used.
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
    /// Where uploaded videos are written before they go to the file API.
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl AvatarConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let backend: StorageBackend = get_env("STORAGE_BACKEND", Some("supabase"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let (supabase_url, supabase_service_key) = match backend {
            StorageBackend::Supabase => (
                Some(get_env("SUPABASE_URL", None, is_prod)?),
                Some(Secret::new(get_env("SUPABASE_SERVICE_KEY", None, is_prod)?)),
            ),
            StorageBackend::Local => (
                get_optional_env("SUPABASE_URL"),
                get_optional_env("SUPABASE_SERVICE_KEY").map(Secret::new),
            ),
        };

        let database_url = if is_prod {
            Some(get_env("DATABASE_URL", None, is_prod)?)
        } else {
            get_optional_env("DATABASE_URL")
        };

        let default_public_base = format!("http://localhost:{}/media", common_config.port);

        Ok(AvatarConfig {
            image: ImageConfig {
                api_base_url: get_env(
                    "IMAGE_API_BASE_URL",
                    Some("https://image.pollinations.ai"),
                    is_prod,
                )?,
                width: get_env_parsed("IMAGE_WIDTH", 512, is_prod)?,
                height: get_env_parsed("IMAGE_HEIGHT", 512, is_prod)?,
            },
            gemini: GeminiSettings {
                api_base_url: get_env(
                    "GEMINI_API_BASE_URL",
                    Some("https://generativelanguage.googleapis.com"),
                    is_prod,
                )?,
                api_key: Secret::new(get_env("GOOGLE_API_KEY", None, is_prod)?),
                model: get_env("GEMINI_MODEL", Some("gemini-flash-latest"), is_prod)?,
                file_poll_interval_ms: get_env_parsed(
                    "GEMINI_FILE_POLL_INTERVAL_MS",
                    2_000,
                    is_prod,
                )?,
                file_poll_timeout_secs: get_env_parsed(
                    "GEMINI_FILE_POLL_TIMEOUT_SECS",
                    300,
                    is_prod,
                )?,
            },
            elevenlabs: ElevenLabsConfig {
                api_base_url: get_env(
                    "ELEVENLABS_API_BASE_URL",
                    Some("https://api.elevenlabs.io"),
                    is_prod,
                )?,
                api_key: Secret::new(get_env("ELEVENLABS_API_KEY", None, is_prod)?),
            },
            storage: StorageConfig {
                backend,
                bucket: get_env("STORAGE_BUCKET", Some("avatar-images"), is_prod)?,
                supabase_url,
                supabase_service_key,
                local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), is_prod)?,
                public_base_url: get_env(
                    "STORAGE_PUBLIC_BASE_URL",
                    Some(&default_public_base),
                    is_prod,
                )?,
            },
            database: DatabaseConfig {
                url: database_url.map(Secret::new),
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", 5, is_prod)?,
                run_migrations: get_env_parsed("DATABASE_RUN_MIGRATIONS", false, is_prod)?,
            },
            upload: UploadConfig {
                max_bytes: get_env_parsed("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES, is_prod)?,
                staging_dir: get_optional_env("UPLOAD_STAGING_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(std::env::temp_dir),
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some("*"),
                    is_prod,
                )?),
            },
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            common: common_config,
        })
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "supabase" => Ok(StorageBackend::Supabase),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
