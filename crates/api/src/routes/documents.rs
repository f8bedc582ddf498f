use axum::Json;
use axum::extract::{Multipart, State};
use extract::ReportType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::metrics::TimedOperation;
use crate::routes::form::Form;

/// Owner folded into report image names; extraction does not require sign-in.
const ANONYMOUS_OWNER: &str = "anonymous";

#[derive(Debug, Serialize)]
pub struct ExtractIcdResponse {
    pub report_type: ReportType,
    pub disease_name: Option<String>,
    pub disease_icd_code: Option<String>,
    pub medicine_name: Option<String>,
    pub full_description: Option<String>,
    pub image_url: Option<String>,
}

pub async fn extract_icd(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ExtractIcdResponse>, ApiError> {
    let mut form = Form::read(multipart).await?;
    let upload = form
        .take_file("file")
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    if !upload.is_image() {
        return Err(ApiError::BadRequest("File must be an image".to_string()));
    }

    let image_url = state
        .uploads
        .save_report_image(
            &upload.bytes,
            upload.file_name.as_deref().unwrap_or_default(),
            ANONYMOUS_OWNER,
        )
        .await?;

    let data_url = match ingest::to_data_url(&upload.bytes) {
        Ok(data_url) => data_url,
        Err(e) => {
            if let Err(delete_err) = state.uploads.delete(&image_url).await {
                warn!(image_url = %image_url, error = %delete_err, "Failed to remove invalid upload");
            }
            return Err(ApiError::BadRequest(format!("Invalid image file: {e}")));
        }
    };

    let timer = TimedOperation::start();
    let document = state
        .extractor
        .extract_from_image(&data_url)
        .await
        .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;
    state.metrics.record_extraction(timer.elapsed(), &document.fields);

    info!(
        image_url = %image_url,
        bytes = upload.bytes.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Extracted document"
    );

    let fields = document.fields;
    Ok(Json(ExtractIcdResponse {
        report_type: document.report_type.unwrap_or_default(),
        disease_name: fields.disease_name,
        disease_icd_code: fields.disease_icd_code,
        medicine_name: fields.medicine_name,
        full_description: fields.full_description,
        image_url: Some(image_url),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source_language: Option<String>,
    pub target_language: String,
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let timer = TimedOperation::start();
    let translated_text = state
        .translator
        .translate(&request.text, &request.target_language)
        .await
        .map_err(|e| ApiError::Upstream(format!("Translation failed: {e:#}")))?;
    state.metrics.record_translation(timer.elapsed());

    Ok(Json(TranslateResponse {
        translated_text,
        source_language: None,
        target_language: request.target_language,
    }))
}
