use chrono::Utc;
use ingest::is_local_upload;
use tracing::info;

use crate::db::Database;
use crate::models::{GoogleAccount, User, UserUpdate};

impl Database {
    pub async fn get_user(&self, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_by_google_id(&self, google_id: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE google_id = ?1")
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find the user behind a Google identity, by Google id first and then
    /// by email, or create one. Returns the user and whether it was created.
    ///
    /// A picture the user uploaded themselves is never replaced by the
    /// Google profile picture.
    pub async fn upsert_google_user(&self, account: &GoogleAccount) -> sqlx::Result<(User, bool)> {
        let email = account.email.as_deref().filter(|e| !e.is_empty());

        let existing = match self.find_user_by_google_id(&account.google_id).await? {
            Some(user) => Some(user),
            None => match email {
                Some(email) => self.find_user_by_email(email).await?,
                None => None,
            },
        };

        let Some(user) = existing else {
            let user: User = sqlx::query_as(
                "INSERT INTO users (google_id, email, name, picture_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING *",
            )
            .bind(&account.google_id)
            .bind(email.unwrap_or_default())
            .bind(&account.name)
            .bind(&account.picture_url)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

            info!(user_id = user.id, "Created user from Google sign-in");
            return Ok((user, true));
        };

        let picture_url = match &account.picture_url {
            Some(url) if !is_local_upload(user.picture_url.as_deref()) => Some(url.clone()),
            _ => user.picture_url.clone(),
        };

        let user: User = sqlx::query_as(
            "UPDATE users
             SET google_id = ?1, email = ?2, name = ?3, picture_url = ?4, updated_at = ?5
             WHERE id = ?6
             RETURNING *",
        )
        .bind(&account.google_id)
        .bind(email.unwrap_or(&user.email))
        .bind(account.name.as_ref().or(user.name.as_ref()))
        .bind(picture_url)
        .bind(Utc::now())
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok((user, false))
    }

    /// Write the provided fields; returns `None` when the user does not exist.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> sqlx::Result<Option<User>> {
        self.write_profile(id, update, false).await
    }

    /// Store the onboarding answers and mark onboarding complete.
    pub async fn complete_onboarding(
        &self,
        id: i64,
        onboarding: &UserUpdate,
    ) -> sqlx::Result<Option<User>> {
        self.write_profile(id, onboarding, true).await
    }

    async fn write_profile(
        &self,
        id: i64,
        update: &UserUpdate,
        complete_onboarding: bool,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as(
            "UPDATE users SET
                name = COALESCE(?1, name),
                language = COALESCE(?2, language),
                phone = COALESCE(?3, phone),
                nickname = COALESCE(?4, nickname),
                birth_year = COALESCE(?5, birth_year),
                birth_month = COALESCE(?6, birth_month),
                birth_day = COALESCE(?7, birth_day),
                gender = COALESCE(?8, gender),
                visit_purpose = COALESCE(?9, visit_purpose),
                picture_url = COALESCE(?10, picture_url),
                onboarding_completed = onboarding_completed OR ?11,
                updated_at = ?12
             WHERE id = ?13
             RETURNING *",
        )
        .bind(&update.name)
        .bind(&update.language)
        .bind(&update.phone)
        .bind(&update.nickname)
        .bind(&update.birth_year)
        .bind(&update.birth_month)
        .bind(&update.birth_day)
        .bind(&update.gender)
        .bind(&update.visit_purpose)
        .bind(&update.picture_url)
        .bind(complete_onboarding)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a user and, through the foreign key, all of their reports.
    pub async fn delete_user(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(google_id: &str, email: &str) -> GoogleAccount {
        GoogleAccount {
            google_id: google_id.to_string(),
            email: Some(email.to_string()),
            name: Some("Kim Minji".to_string()),
            picture_url: Some("https://lh3.googleusercontent.com/a/one".to_string()),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let db = Database::in_memory().await.unwrap();

        let (created, is_new) = db.upsert_google_user(&account("g-1", "minji@example.com")).await.unwrap();
        assert!(is_new);
        assert_eq!(created.email, "minji@example.com");
        assert!(!created.onboarding_completed);

        let mut renamed = account("g-1", "minji@example.com");
        renamed.name = Some("Minji".to_string());
        let (updated, is_new) = db.upsert_google_user(&renamed).await.unwrap();
        assert!(!is_new);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name.as_deref(), Some("Minji"));
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_upsert_links_existing_email() {
        let db = Database::in_memory().await.unwrap();
        let (first, _) = db.upsert_google_user(&account("g-old", "same@example.com")).await.unwrap();

        let (linked, is_new) = db.upsert_google_user(&account("g-new", "same@example.com")).await.unwrap();
        assert!(!is_new);
        assert_eq!(linked.id, first.id);
        assert_eq!(linked.google_id.as_deref(), Some("g-new"));
        assert!(db.find_user_by_google_id("g-old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_uploaded_picture() {
        let db = Database::in_memory().await.unwrap();
        let (user, _) = db.upsert_google_user(&account("g-1", "a@example.com")).await.unwrap();

        let upload = UserUpdate {
            picture_url: Some("/uploads/members/member_1_x.jpg".to_string()),
            ..Default::default()
        };
        db.update_user(user.id, &upload).await.unwrap();

        let mut next = account("g-1", "a@example.com");
        next.picture_url = Some("https://lh3.googleusercontent.com/a/two".to_string());
        let (user, _) = db.upsert_google_user(&next).await.unwrap();
        assert_eq!(user.picture_url.as_deref(), Some("/uploads/members/member_1_x.jpg"));
    }

    #[tokio::test]
    async fn test_update_user_is_partial() {
        let db = Database::in_memory().await.unwrap();
        let (user, _) = db.upsert_google_user(&account("g-1", "a@example.com")).await.unwrap();

        let update = UserUpdate {
            phone: Some("010-1234-5678".to_string()),
            ..Default::default()
        };
        let updated = db.update_user(user.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.phone.as_deref(), Some("010-1234-5678"));
        assert_eq!(updated.name, user.name);
        assert!(!updated.onboarding_completed);

        assert!(db.update_user(999, &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_onboarding() {
        let db = Database::in_memory().await.unwrap();
        let (user, _) = db.upsert_google_user(&account("g-1", "a@example.com")).await.unwrap();

        let answers = UserUpdate {
            language: Some("ko".to_string()),
            birth_year: Some("1990".to_string()),
            visit_purpose: Some("treatment".to_string()),
            ..Default::default()
        };
        let user = db.complete_onboarding(user.id, &answers).await.unwrap().unwrap();
        assert!(user.onboarding_completed);
        assert_eq!(user.language.as_deref(), Some("ko"));

        // later partial updates never reset the flag
        let user = db.update_user(user.id, &UserUpdate::default()).await.unwrap().unwrap();
        assert!(user.onboarding_completed);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = Database::in_memory().await.unwrap();
        let (user, _) = db.upsert_google_user(&account("g-1", "a@example.com")).await.unwrap();

        assert!(db.delete_user(user.id).await.unwrap());
        assert!(db.get_user(user.id).await.unwrap().is_none());
        assert!(!db.delete_user(user.id).await.unwrap());
    }
}
