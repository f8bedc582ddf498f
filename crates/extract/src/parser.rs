use regex::Regex;
use std::sync::LazyLock;

use crate::normalizer::{
    char_len, clean_label_value, clean_phrase_value, normalize_line_endings,
};
use crate::schema::ExtractionResult;

/// ICD-10 shape: letter, two digits, optional decimal part, optional
/// hyphenated alphanumeric suffix.
const ICD_SHAPE: &str = r"[A-Z][0-9]{2}(?:\.[0-9]+)?(?:-[A-Z0-9]+)?";

/// Characters of context inspected on each side of an unlabeled code.
const ICD_CONTEXT_RADIUS: usize = 150;

const ICD_CONTEXT_KEYWORDS: [&str; 6] =
    ["disease", "disorder", "condition", "diagnosis", "icd", "code"];

struct FieldRule {
    pattern: Regex,
    clean: fn(&str) -> String,
    min_chars: usize,
}

impl FieldRule {
    fn new(pattern: &str, clean: fn(&str) -> String, min_chars: usize) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            clean,
            min_chars,
        }
    }

    /// Only the first match of the pattern is considered; a short capture
    /// rejects the whole rule.
    fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = (self.clean)(caps.get(1)?.as_str());
        (char_len(&value) >= self.min_chars).then_some(value)
    }
}

fn first_accepted(rules: &[FieldRule], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(text))
}

fn label_rules(labels: &[&str], min_chars: usize) -> Vec<FieldRule> {
    labels
        .iter()
        .map(|label| {
            FieldRule::new(
                &format!(r"(?i){label}[:\s]+([^\n]+)"),
                clean_label_value,
                min_chars,
            )
        })
        .collect()
}

static DISEASE_LABELS: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    label_rules(
        &[
            r"\*\*Disease Name\*\*",
            "Disease Name",
            "Disease",
            "Diagnosis",
            "Condition",
        ],
        3,
    )
});

static DISEASE_PHRASES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![FieldRule::new(
        r"(?i)(?:for|treat|treating|diagnosis|condition|indication)[:\s]+([A-Z][a-z]+(?:\s+[a-z]+){0,5})",
        clean_label_value,
        4,
    )]
});

static MEDICINE_LABELS: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    label_rules(
        &[
            r"\*\*Medicine Name\*\*",
            "Medicine Name",
            "Medication",
            "Medicine",
            "Drug",
            "Prescribed",
        ],
        3,
    )
});

static MEDICINE_PHRASES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    ["prescription", "medication", "prescribed", "drug"]
        .iter()
        .map(|cue| {
            FieldRule::new(
                &format!(r"(?i){cue}[:\s]+([A-Z][a-zA-Z0-9.\s/-]+)"),
                clean_phrase_value,
                3,
            )
        })
        .collect()
});

static ICD_LABELS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\*\*Disease ICD Code\*\*",
        "Disease ICD Code",
        r"ICD[-\s]?10(?:[-\s]?code)?",
        "ICD Code",
    ]
    .iter()
    .map(|label| Regex::new(&format!(r"(?i){label}[:\s*]+({ICD_SHAPE})")).unwrap())
    .collect()
});

static ICD_VALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{ICD_SHAPE}$")).unwrap());

static ICD_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b({ICD_SHAPE})\b")).unwrap());

/// Extract disease name, ICD code and medicine name from `text`.
///
/// `full_description` echoes the input verbatim. Empty input yields an
/// all-`None` result.
pub fn parse_response(text: &str) -> ExtractionResult {
    if text.is_empty() {
        return ExtractionResult::default();
    }

    let normalized = normalize_line_endings(text);

    let disease_name = first_accepted(&DISEASE_LABELS, &normalized)
        .or_else(|| first_accepted(&DISEASE_PHRASES, &normalized));
    let medicine_name = first_accepted(&MEDICINE_LABELS, &normalized)
        .or_else(|| first_accepted(&MEDICINE_PHRASES, &normalized));
    let disease_icd_code =
        labeled_icd_code(&normalized).or_else(|| contextual_icd_code(&normalized));

    ExtractionResult {
        disease_name,
        disease_icd_code,
        medicine_name,
        full_description: Some(text.to_string()),
    }
}

/// Same as [`parse_response`], treating a missing response like an empty one.
pub fn parse_optional(text: Option<&str>) -> ExtractionResult {
    text.map(parse_response).unwrap_or_default()
}

fn labeled_icd_code(text: &str) -> Option<String> {
    ICD_LABELS.iter().find_map(|pattern| {
        let code = pattern.captures(text)?.get(1)?.as_str().trim().to_uppercase();
        ICD_VALID.is_match(&code).then_some(code)
    })
}

// TODO: the last-resort pick below can label any letter+digits token (a room
// number, a lot id) as a diagnosis code; decide whether to drop it.
fn contextual_icd_code(text: &str) -> Option<String> {
    let mut first_valid = None;

    for found in ICD_ANYWHERE.find_iter(text) {
        let code = found.as_str().to_uppercase();
        if !ICD_VALID.is_match(&code) {
            continue;
        }

        let context = char_window(text, found.start(), found.end(), ICD_CONTEXT_RADIUS)
            .to_lowercase();
        if ICD_CONTEXT_KEYWORDS.iter().any(|kw| context.contains(kw)) {
            return Some(code);
        }

        first_valid.get_or_insert(code);
    }

    first_valid
}

/// Slice of `text` spanning `radius` characters either side of `start..end`.
fn char_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(radius - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(idx, _)| end + idx)
        .unwrap_or(text.len());
    &text[from..to]
}
