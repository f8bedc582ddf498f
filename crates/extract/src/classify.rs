use regex::Regex;
use std::sync::LazyLock;

use crate::schema::ReportType;

static TYPE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:report|document)\s+type\**[:\s]+\**\s*([a-z _-]+)").unwrap()
});

fn keywords(report_type: ReportType) -> &'static [&'static str] {
    match report_type {
        ReportType::Prescription => &["prescription", "prescribed", "rx", "dosage", "tablet"],
        ReportType::ExaminationReport => &[
            "examination",
            "lab result",
            "laboratory",
            "test result",
            "reference range",
            "blood test",
        ],
        ReportType::MedicalCertificate => &[
            "medical certificate",
            "certificate",
            "certify",
            "fit for",
            "sick leave",
        ],
    }
}

/// Guess which kind of document a model response describes.
///
/// An explicit "Report Type:" line wins; otherwise the type with the most
/// keyword hits, with ties going to the earlier entry of [`ReportType::ALL`].
pub fn detect_report_type(text: &str) -> Option<ReportType> {
    if let Some(labeled) = TYPE_LABEL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| ReportType::parse(m.as_str()))
    {
        return Some(labeled);
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut best: Option<(ReportType, usize)> = None;
    for report_type in ReportType::ALL {
        let hits = keywords(report_type)
            .iter()
            .filter(|kw| {
                if kw.contains(' ') {
                    lower.contains(**kw)
                } else {
                    words.contains(*kw)
                }
            })
            .count();
        if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
            best = Some((report_type, hits));
        }
    }

    best.map(|(report_type, _)| report_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_label() {
        let text = "**Report Type:** Medical Certificate\nPatient is prescribed rest.";
        assert_eq!(detect_report_type(text), Some(ReportType::MedicalCertificate));
    }

    #[test]
    fn test_keyword_scoring() {
        let text = "Laboratory blood test: hemoglobin 13.2 g/dL, reference range 12-16.";
        assert_eq!(detect_report_type(text), Some(ReportType::ExaminationReport));

        let text = "Rx: Amoxicillin 500mg tablet, dosage three times daily.";
        assert_eq!(detect_report_type(text), Some(ReportType::Prescription));
    }

    #[test]
    fn test_rx_needs_whole_word() {
        assert_eq!(detect_report_type("Proxy settings"), None);
    }

    #[test]
    fn test_nothing_recognised() {
        assert_eq!(detect_report_type("A photo of a cat."), None);
    }
}
