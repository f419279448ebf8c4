//! Application startup and lifecycle management.
//!
//! Wires the upstream clients, storage backend and repository into
//! [`AppState`], builds the HTTP router and runs it until shutdown.

use crate::config::{AvatarConfig, StorageBackend};
use crate::handlers;
use crate::services::{
    AvatarRepository, ElevenLabsClient, GeminiConfig, GeminiTextProvider, ImageGenerator,
    InMemoryRepository, LocalStorage, PgAvatarRepository, PollinationsClient, Storage,
    SupabaseStorage, TextProvider, VoiceAgentClient,
};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Whole-request timeout for upstream calls. Video uploads dominate.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(300);
const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AvatarConfig,
    pub repository: Arc<dyn AvatarRepository>,
    pub storage: Arc<dyn Storage>,
    pub image_generator: Arc<dyn ImageGenerator>,
    pub text_provider: Arc<dyn TextProvider>,
    pub voice_agent: Arc<dyn VoiceAgentClient>,
}

impl AppState {
    /// Build the production collaborators described by `config`.
    pub async fn from_config(config: &AvatarConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .connect_timeout(UPSTREAM_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                AppError::InternalError(e.into())
            })?;

        let repository: Arc<dyn AvatarRepository> = match &config.database.url {
            Some(url) => {
                let repository =
                    PgAvatarRepository::connect(url.expose_secret(), config.database.max_connections)
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to connect to Postgres: {}", e);
                            e
                        })?;
                if config.database.run_migrations {
                    repository.run_migrations().await?;
                }
                Arc::new(repository)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, avatars are kept in memory");
                Arc::new(InMemoryRepository::new())
            }
        };

        let storage: Arc<dyn Storage> = match config.storage.backend {
            StorageBackend::Supabase => {
                let (Some(url), Some(key)) = (
                    config.storage.supabase_url.clone(),
                    config.storage.supabase_service_key.clone(),
                ) else {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "SUPABASE_URL and SUPABASE_SERVICE_KEY are required for supabase storage"
                    )));
                };
                Arc::new(SupabaseStorage::new(
                    client.clone(),
                    url,
                    config.storage.bucket.clone(),
                    key,
                ))
            }
            StorageBackend::Local => Arc::new(
                LocalStorage::new(&config.storage.local_path, &config.storage.public_base_url)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to initialize local storage at {}: {}",
                            config.storage.local_path,
                            e
                        );
                        e
                    })?,
            ),
        };

        let image_generator = Arc::new(PollinationsClient::new(
            client.clone(),
            &config.image.api_base_url,
            config.image.width,
            config.image.height,
        ));

        let text_provider = Arc::new(GeminiTextProvider::new(
            GeminiConfig {
                api_base_url: config.gemini.api_base_url.clone(),
                api_key: config.gemini.api_key.clone(),
                model: config.gemini.model.clone(),
            },
            client.clone(),
        ));

        let voice_agent = Arc::new(ElevenLabsClient::new(
            client,
            &config.elevenlabs.api_base_url,
            config.elevenlabs.api_key.clone(),
        ));

        tracing::info!(
            storage_backend = ?config.storage.backend,
            gemini_model = %config.gemini.model,
            "Application state initialized"
        );

        Ok(Self {
            config: config.clone(),
            repository,
            storage,
            image_generator,
            text_provider,
            voice_agent,
        })
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    layer.allow_origin(
        allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                    None
                }
            })
            .collect::<Vec<HeaderValue>>(),
    )
}

/// Build the HTTP router for `state`.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let api = Router::new()
        .route("/api", get(handlers::health_check))
        .route("/api/generate-image", post(handlers::generate_image))
        .route("/api/upload-avatar-image", post(handlers::upload_avatar_image))
        .route("/api/generate-prompt", post(handlers::generate_prompt))
        .route(
            "/api/generate-prompt-from-video",
            post(handlers::generate_prompt_from_video),
        )
        .route("/api/create-agent", post(handlers::create_agent))
        .route("/api/avatars", get(handlers::list_avatars))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/sessions/:session_id", get(handlers::get_session));

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(api);

    if config.storage.backend == StorageBackend::Local {
        app = app.nest_service("/media", ServeDir::new(&config.storage.local_path));
    }

    let body_limit = config.upload.max_bytes;
    let cors = cors_layer(&config.cors.allowed_origins);

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with production collaborators.
    pub async fn build(config: AvatarConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config).await?;
        Self::build_with_state(config, state).await
    }

    /// Build the application around an existing state. Port 0 binds a random port.
    pub async fn build_with_state(config: AvatarConfig, state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Avatar service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve requests until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
