use serde::{Deserialize, Serialize};

/// Best-effort fields pulled out of a model's description of a medical document.
///
/// Every field is optional: a missing match simply leaves it unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub disease_name: Option<String>,
    pub disease_icd_code: Option<String>,
    pub medicine_name: Option<String>,
    pub full_description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Prescription,
    MedicalCertificate,
    ExaminationReport,
}

impl ReportType {
    pub const ALL: [ReportType; 3] = [
        ReportType::Prescription,
        ReportType::ExaminationReport,
        ReportType::MedicalCertificate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Prescription => "prescription",
            ReportType::MedicalCertificate => "medical_certificate",
            ReportType::ExaminationReport => "examination_report",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "prescription" => Some(ReportType::Prescription),
            "medical_certificate" | "certificate" => Some(ReportType::MedicalCertificate),
            "examination_report" | "examination" | "exam_report" => {
                Some(ReportType::ExaminationReport)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of analysing one uploaded document image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub report_type: Option<ReportType>,
    #[serde(flatten)]
    pub fields: ExtractionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_parse() {
        assert_eq!(ReportType::parse("Prescription"), Some(ReportType::Prescription));
        assert_eq!(
            ReportType::parse("Medical Certificate"),
            Some(ReportType::MedicalCertificate)
        );
        assert_eq!(
            ReportType::parse("examination-report"),
            Some(ReportType::ExaminationReport)
        );
        assert_eq!(ReportType::parse("invoice"), None);
    }

    #[test]
    fn test_extracted_document_serializes_flat() {
        let doc = ExtractedDocument {
            report_type: Some(ReportType::MedicalCertificate),
            fields: ExtractionResult {
                disease_name: Some("Hypertension".to_string()),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["report_type"], "medical_certificate");
        assert_eq!(json["disease_name"], "Hypertension");
        assert!(json["medicine_name"].is_null());
    }
}
