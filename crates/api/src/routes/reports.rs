use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use index::{NewReport, Report};
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

fn not_found() -> ApiError {
    ApiError::NotFound("Report not found".to_string())
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(state.db.list_reports(user.id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(report): Json<NewReport>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = state.db.create_report(user.id, &report).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    state
        .db
        .get_report(user.id, &id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_report(user.id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
