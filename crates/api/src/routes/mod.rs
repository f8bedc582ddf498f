pub mod documents;
pub mod form;
pub mod reports;
pub mod users;

use axum::Json;
use axum::extract::State;
use index::IndexStats;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;
use crate::metrics::MetricsSnapshot;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            format!("error: {e}")
        }
    };

    Json(HealthResponse {
        status: "ok",
        database,
    })
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    metrics: MetricsSnapshot,
    store: IndexStats,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(StatsResponse {
        metrics: state.metrics.snapshot(),
        store: state.db.stats().await?,
    }))
}
