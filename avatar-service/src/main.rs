use avatar_service::config::AvatarConfig;
use avatar_service::services::init_metrics;
use avatar_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Metrics recorder must exist before anything is recorded
    if let Err(e) = init_metrics() {
        eprintln!("Failed to initialize metrics: {}", e);
    }

    let config = AvatarConfig::load()
        .map_err(|e| std::io::Error::other(format!("Configuration error: {}", e)))?;

    init_tracing(
        "avatar-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
