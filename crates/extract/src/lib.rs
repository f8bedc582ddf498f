pub mod schema;
pub mod normalizer;
pub mod parser;
pub mod classify;
pub mod stream;
pub mod llm;
pub mod prompt;

pub use schema::{ExtractedDocument, ExtractionResult, ReportType};
pub use parser::{parse_optional, parse_response};
pub use classify::detect_report_type;
pub use llm::{GroqClient, Translator, VisionModel};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Runs a document image through the vision model and parses its answer.
#[derive(Clone)]
pub struct Extractor {
    vision: Arc<dyn VisionModel>,
}

impl Extractor {
    pub fn new(vision: Arc<dyn VisionModel>) -> Self {
        Self { vision }
    }

    /// Structure a model response that has already been collected.
    pub fn extract_from_text(&self, text: &str) -> ExtractedDocument {
        ExtractedDocument {
            report_type: detect_report_type(text),
            fields: parse_response(text),
        }
    }

    pub async fn extract_from_image(&self, image_data_url: &str) -> Result<ExtractedDocument> {
        let response = self
            .vision
            .analyze_document(image_data_url)
            .await
            .context("Error calling vision model")?;

        if response.is_empty() {
            anyhow::bail!("No response from vision model");
        }

        let document = self.extract_from_text(&response);
        info!(
            report_type = ?document.report_type,
            disease = document.fields.disease_name.is_some(),
            icd_code = document.fields.disease_icd_code.is_some(),
            medicine = document.fields.medicine_name.is_some(),
            "Document fields extracted"
        );
        Ok(document)
    }
}
