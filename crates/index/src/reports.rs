use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{NewReport, Report};

/// Report queries are always scoped to their owner: another user's report
/// is indistinguishable from a missing one.
impl Database {
    /// The user's reports, newest first.
    pub async fn list_reports(&self, user_id: i64) -> sqlx::Result<Vec<Report>> {
        sqlx::query_as(
            "SELECT * FROM reports WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_report(&self, user_id: i64, report: &NewReport) -> sqlx::Result<Report> {
        let report_type = report.report_type.unwrap_or_default();

        let created: Report = sqlx::query_as(
            "INSERT INTO reports (
                id, user_id, report_type, disease_name, disease_icd_code, medicine_name,
                full_description, translated_text, original_language, target_language,
                image_url, created_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             RETURNING *",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(report_type.as_str())
        .bind(&report.disease_name)
        .bind(&report.disease_icd_code)
        .bind(&report.medicine_name)
        .bind(&report.full_description)
        .bind(&report.translated_text)
        .bind(&report.original_language)
        .bind(&report.target_language)
        .bind(&report.image_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(user_id, report_id = %created.id, report_type = %report_type, "Report created");
        Ok(created)
    }

    pub async fn get_report(&self, user_id: i64, id: &str) -> sqlx::Result<Option<Report>> {
        sqlx::query_as("SELECT * FROM reports WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_report(&self, user_id: i64, id: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
