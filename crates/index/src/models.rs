use chrono::{DateTime, Utc};
use extract::ReportType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub google_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub language: Option<String>,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub birth_year: Option<String>,
    pub birth_month: Option<String>,
    pub birth_day: Option<String>,
    pub gender: Option<String>,
    pub visit_purpose: Option<String>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Identity claims used to find or create a user after Google sign-in.
#[derive(Debug, Clone, Default)]
pub struct GoogleAccount {
    pub google_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub birth_year: Option<String>,
    pub birth_month: Option<String>,
    pub birth_day: Option<String>,
    pub gender: Option<String>,
    pub visit_purpose: Option<String>,
    /// Set server-side from an uploaded profile image.
    #[serde(skip)]
    pub picture_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Report {
    pub id: String,
    pub user_id: i64,
    pub report_type: String,
    pub disease_name: Option<String>,
    pub disease_icd_code: Option<String>,
    pub medicine_name: Option<String>,
    pub full_description: Option<String>,
    pub translated_text: Option<String>,
    pub original_language: Option<String>,
    pub target_language: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewReport {
    #[serde(default)]
    pub report_type: Option<ReportType>,
    pub disease_name: Option<String>,
    pub disease_icd_code: Option<String>,
    pub medicine_name: Option<String>,
    pub full_description: Option<String>,
    pub translated_text: Option<String>,
    pub original_language: Option<String>,
    pub target_language: Option<String>,
    pub image_url: Option<String>,
}
