/// Language codes accepted by the translator, with the display name used in
/// the prompt.
pub const LANGUAGE_NAMES: [(&str, &str); 10] = [
    ("en", "English"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("es", "Spanish"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("uz", "Uzbek"),
];

/// Display name for a language code; unknown codes are passed through.
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn build_description_prompt() -> &'static str {
    r#"Please analyze this medical document image carefully and provide a detailed description. Focus on:

1. Patient information (name, age, ID if visible)
2. Document date
3. Doctor/physician name and credentials
4. Diagnoses or conditions mentioned
5. All medications prescribed (names, dosages, frequencies)
6. Dosage instructions
7. Any other relevant medical information

Please be thorough and extract all text and medical information from the document."#
}

pub fn build_structured_prompt() -> &'static str {
    r#"Based on the document analysis, extract the following information in this exact structured format:

**Report Type:** [One of: Prescription, Medical Certificate, Examination Report]

**Disease Name:** [The diagnosed disease or condition. Use the most specific name given.]

**Disease ICD Code:** [The ICD-10 code for the disease, for example E11.9. Write "Unknown" if it cannot be determined.]

**Medicine Name:** [The full name(s) of the medication(s) prescribed. Include generic and brand names if both are present.]

**Full Description:** [A comprehensive description of the document including patient details, medications, dosages, instructions, and any other relevant medical information.]

Please be precise and accurate."#
}

pub fn build_follow_up_instruction() -> &'static str {
    "Now extract the structured information as requested: Report Type, Disease Name, Disease ICD Code, Medicine Name, and Full Description."
}

pub fn build_translation_prompt(target_language: &str) -> String {
    format!(
        "You are a professional medical translator. Translate the following medical text accurately to {}. \
        Preserve medical terminology and ensure the translation is clear and accurate. \
        Only output the translation, nothing else.",
        language_name(target_language)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name_lookup() {
        assert_eq!(language_name("ko"), "Korean");
        assert_eq!(language_name("uz"), "Uzbek");
        assert_eq!(language_name("fr"), "fr");
    }

    #[test]
    fn test_translation_prompt_names_language() {
        let prompt = build_translation_prompt("ja");
        assert!(prompt.contains("accurately to Japanese."));
    }

    #[test]
    fn test_structured_prompt_matches_parser_labels() {
        let prompt = build_structured_prompt();
        for label in ["**Disease Name:**", "**Disease ICD Code:**", "**Medicine Name:**", "**Report Type:**"] {
            assert!(prompt.contains(label), "missing {label}");
        }
    }
}
