pub mod config;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod routes;

pub use config::{AppConfig, LogFormat, ServerConfig};
pub use error::ApiError;
pub use extractors::CurrentUser;
pub use metrics::{Metrics, MetricsSnapshot};

use auth::{IdentityVerifier, SessionKeys};
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use extract::{Extractor, Translator};
use index::Database;
use ingest::UploadStore;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub struct AppState {
    pub db: Database,
    pub extractor: Extractor,
    pub translator: Arc<dyn Translator>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub sessions: SessionKeys,
    pub uploads: UploadStore,
    pub metrics: Arc<Metrics>,
}

/// Every route, served at the root and again under `/api`.
pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health))
        .route("/stats", get(routes::stats))
        .route("/extract-icd", post(routes::documents::extract_icd))
        .route("/translate", post(routes::documents::translate))
        .route("/reports", get(routes::reports::list).post(routes::reports::create))
        .route("/reports/:id", get(routes::reports::get).delete(routes::reports::delete))
        .route("/auth/google", post(routes::users::google_login))
        .route("/auth/register", post(routes::users::register))
        .route("/auth/logout", post(routes::users::logout))
        .route("/auth/me", get(routes::users::me))
        .route(
            "/users/me",
            get(routes::users::me)
                .put(routes::users::update_me)
                .delete(routes::users::delete_me),
        );

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(origin).unwrap_or_else(|e| {
        warn!(origin, error = %e, "Invalid CORS origin, using default");
        HeaderValue::from_static(config::DEFAULT_CORS_ORIGIN)
    });

    // Credentials rule out wildcards, so methods and headers are mirrored.
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn track_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    state
        .metrics
        .record_request(!status.is_client_error() && !status.is_server_error());
    response
}
