use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of characters kept for any extracted field.
pub const MAX_FIELD_CHARS: usize = 200;

static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+").unwrap());
static BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\[\]]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Collapse runs of whitespace into one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Cut `text` down to at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Clean a value captured after a label such as `Disease Name:`.
///
/// Strips markdown emphasis and square brackets, collapses whitespace,
/// trims, and caps the result at [`MAX_FIELD_CHARS`].
pub fn clean_label_value(raw: &str) -> String {
    let text = EMPHASIS.replace_all(raw.trim(), "");
    let text = BRACKETS.replace_all(&text, "");
    truncate_chars(&collapse_whitespace(&text), MAX_FIELD_CHARS)
}

/// Clean a medicine name caught by a contextual phrase: keep only the text
/// before the first comma or line break.
pub fn clean_phrase_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let head = trimmed
        .split([',', '\n'])
        .next()
        .unwrap_or_default();
    truncate_chars(&collapse_whitespace(head), MAX_FIELD_CHARS)
}

/// Character length, which is what the length rules are expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_label_value() {
        assert_eq!(clean_label_value("** Hypertension"), "Hypertension");
        assert_eq!(clean_label_value("[Type 2   Diabetes]  "), "Type 2 Diabetes");
        assert_eq!(clean_label_value("  ***bold***  text "), "bold text");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "é".repeat(250);
        let cut = truncate_chars(&text, MAX_FIELD_CHARS);
        assert_eq!(cut.chars().count(), 200);
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn test_clean_phrase_value_stops_at_delimiters() {
        assert_eq!(clean_phrase_value("Amoxicillin 500mg, twice daily"), "Amoxicillin 500mg");
        assert_eq!(clean_phrase_value("Metformin\nTake with food"), "Metformin");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
