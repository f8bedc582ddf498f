use anyhow::{Context, Result};
use api::{AppConfig, AppState, LogFormat, Metrics, router};
use auth::{GoogleVerifier, SessionKeys};
use extract::{Extractor, GroqClient};
use index::Database;
use ingest::UploadStore;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_tracing(config.log_format);

    info!(config = %serde_json::to_string(&config)?, "Loaded configuration");
    if config.uses_default_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }
    if config.llm.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; extraction and translation will fail");
    }
    if config.auth.google_client_id.is_none() {
        warn!("GOOGLE_CLIENT_ID is not set; Google sign-in will be rejected");
    }

    let db = Database::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open database")?;

    let uploads = UploadStore::new(&config.storage.upload_dir);
    uploads.ensure_directories().await?;

    let groq = Arc::new(
        GroqClient::new(config.llm.api_url.clone(), config.llm.api_key.clone())
            .with_models(config.llm.vision_model.clone(), config.llm.text_model.clone()),
    );

    let state = Arc::new(AppState {
        db,
        extractor: Extractor::new(groq.clone()),
        translator: groq,
        verifier: Arc::new(GoogleVerifier::new(config.auth.google_client_id.clone())),
        sessions: SessionKeys::new(&config.auth.jwt_secret, config.auth.jwt_expire_minutes),
        uploads,
        metrics: Metrics::new(),
    });

    let app = router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .context(format!("Failed to bind {}", config.server.bind_addr))?;

    info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
