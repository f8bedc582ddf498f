use anyhow::{Context, Result};
use ingest::sniff_mime_type;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Post an image to a running server's `/extract-icd` and return its JSON
/// answer. The server's `/health` is checked first.
pub async fn upload_image(api_url: &str, image_path: &Path) -> Result<Value> {
    let base = api_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{base}/health"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .context(format!("Cannot connect to backend at {base}"))?;
    if !health.status().is_success() {
        anyhow::bail!("Health check failed. Status: {}", health.status());
    }

    let bytes = tokio::fs::read(image_path)
        .await
        .context(format!("Image file not found: {:?}", image_path))?;
    let mime = sniff_mime_type(&bytes).unwrap_or("image/jpeg");
    let file_name = image_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.jpg")
        .to_string();

    let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name).mime_str(mime)?);
    let response = client
        .post(format!("{base}/extract-icd"))
        .multipart(form)
        .timeout(Duration::from_secs(60))
        .send()
        .await
        .context("Request to /extract-icd failed")?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("Failed to parse /extract-icd response")?;
    if !status.is_success() {
        anyhow::bail!("Extraction failed ({}): {}", status, body["detail"]);
    }

    Ok(body)
}
