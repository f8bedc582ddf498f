use serde::{Deserialize, Serialize};

/// A recorded model response and the fields a reader would pull out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub response: String,
    pub expected: Expected,
    pub category: FixtureCategory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expected {
    pub disease_name: Option<String>,
    pub disease_icd_code: Option<String>,
    pub medicine_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FixtureCategory {
    Structured, // Plain "Label: value" lines
    Markdown,   // Bold labels, bullets, bracketed placeholders
    FreeText,   // Prose with no labels
    NoCode,     // Documents without any diagnosis code
}

impl FixtureCategory {
    pub const ALL: [FixtureCategory; 4] = [
        FixtureCategory::Structured,
        FixtureCategory::Markdown,
        FixtureCategory::FreeText,
        FixtureCategory::NoCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureCategory::Structured => "structured",
            FixtureCategory::Markdown => "markdown",
            FixtureCategory::FreeText => "free_text",
            FixtureCategory::NoCode => "no_code",
        }
    }
}

fn fixture(
    name: &str,
    category: FixtureCategory,
    response: &str,
    disease_name: Option<&str>,
    disease_icd_code: Option<&str>,
    medicine_name: Option<&str>,
) -> Fixture {
    Fixture {
        name: name.to_string(),
        response: response.to_string(),
        expected: Expected {
            disease_name: disease_name.map(str::to_string),
            disease_icd_code: disease_icd_code.map(str::to_string),
            medicine_name: medicine_name.map(str::to_string),
        },
        category,
    }
}

pub fn get_test_set() -> Vec<Fixture> {
    use FixtureCategory::*;

    vec![
        // Structured responses
        fixture(
            "hypertension_prescription",
            Structured,
            "**Report Type:** Prescription\n\
             **Disease Name:** Essential hypertension\n\
             **Disease ICD Code:** I10\n\
             **Medicine Name:** Amlodipine 5mg\n\
             **Full Description:** Take one tablet of Amlodipine daily for blood pressure.",
            Some("Essential hypertension"),
            Some("I10"),
            Some("Amlodipine 5mg"),
        ),
        fixture(
            "diabetes_plain_labels",
            Structured,
            "Disease Name: Type 2 diabetes mellitus\n\
             Disease ICD Code: E11.9\n\
             Medicine Name: Metformin 500mg\n\
             Full Description: Metformin twice daily with meals.",
            Some("Type 2 diabetes mellitus"),
            Some("E11.9"),
            Some("Metformin 500mg"),
        ),
        fixture(
            "disc_herniation_certificate",
            Structured,
            "Report Type: Medical Certificate\r\n\
             Disease Name: Lumbar disc herniation\r\n\
             Disease ICD Code: M51.26\r\n\
             Medicine Name: Celecoxib 200mg\r\n",
            Some("Lumbar disc herniation"),
            Some("M51.26"),
            Some("Celecoxib 200mg"),
        ),
        // Markdown-heavy responses
        fixture(
            "bronchitis_bullets",
            Markdown,
            "## Prescription Summary\n\n\
             - **Diagnosis:** Acute bronchitis\n\
             - **ICD-10:** J20.9\n\
             - **Medication:** Amoxicillin 500mg capsules\n",
            Some("Acute bronchitis"),
            Some("J20.9"),
            Some("Amoxicillin 500mg capsules"),
        ),
        fixture(
            "migraine_placeholders",
            Markdown,
            "**Disease Name:** [Migraine without aura]\n\n\
             **Disease ICD Code:** G43.009\n\n\
             **Medicine Name:** [Sumatriptan 50mg]",
            Some("Migraine without aura"),
            Some("G43.009"),
            Some("Sumatriptan 50mg"),
        ),
        fixture(
            "dermatitis_colon_outside",
            Markdown,
            "**Disease Name**: Atopic dermatitis\n\
             **Disease ICD Code**: L20.9\n\
             **Medicine Name**: Hydrocortisone 1% cream",
            Some("Atopic dermatitis"),
            Some("L20.9"),
            Some("Hydrocortisone 1% cream"),
        ),
        // Free text
        fixture(
            "reflux_prose",
            FreeText,
            "This prescription is for Gastroesophageal reflux disease. Omeprazole 20mg \
             should be taken before breakfast. ICD-10 code K21.9 applies.",
            Some("Gastroesophageal reflux disease"),
            Some("K21.9"),
            Some("Omeprazole 20mg"),
        ),
        fixture(
            "hypertension_note",
            FreeText,
            "Patient diagnosed with hypertension. Prescribed Lisinopril 10mg daily. Code I10.",
            Some("Hypertension"),
            Some("I10"),
            Some("Lisinopril 10mg"),
        ),
        fixture(
            "asthma_prose",
            FreeText,
            "The doctor prescribed Salbutamol inhaler, two puffs as needed, to treat Asthma \
             attacks. ICD J45.909",
            Some("Asthma"),
            Some("J45.909"),
            Some("Salbutamol inhaler"),
        ),
        // No diagnosis code on the document
        fixture(
            "common_cold",
            NoCode,
            "**Disease Name:** Common cold\n\
             **Medicine Name:** Acetaminophen 500mg\n\
             **Full Description:** Rest and fluids recommended. No diagnostic code was written on the document.",
            Some("Common cold"),
            None,
            Some("Acetaminophen 500mg"),
        ),
        fixture(
            "allergic_rhinitis",
            NoCode,
            "Diagnosis: Seasonal allergic rhinitis\n\
             Medication: Cetirizine 10mg once daily",
            Some("Seasonal allergic rhinitis"),
            None,
            Some("Cetirizine 10mg once daily"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_category_is_covered() {
        let fixtures = get_test_set();
        let categories: HashSet<_> = fixtures.iter().map(|f| f.category).collect();
        assert_eq!(categories.len(), FixtureCategory::ALL.len());

        let names: HashSet<_> = fixtures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names.len(), fixtures.len());
    }

    #[test]
    fn test_no_code_fixtures_expect_no_code() {
        for fixture in get_test_set() {
            if fixture.category == FixtureCategory::NoCode {
                assert!(fixture.expected.disease_icd_code.is_none(), "{}", fixture.name);
            }
        }
    }
}
