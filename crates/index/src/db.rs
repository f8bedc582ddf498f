use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        google_id TEXT UNIQUE,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        picture_url TEXT,
        language TEXT,
        phone TEXT,
        nickname TEXT,
        birth_year TEXT,
        birth_month TEXT,
        birth_day TEXT,
        gender TEXT,
        visit_purpose TEXT,
        onboarding_completed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS reports (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        report_type TEXT NOT NULL DEFAULT 'prescription',
        disease_name TEXT,
        disease_icd_code TEXT,
        medicine_name TEXT,
        full_description TEXT,
        translated_text TEXT,
        original_language TEXT,
        target_language TEXT,
        image_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_reports_user_created ON reports(user_id, created_at)",
];

/// Connection pool over the users/reports store.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub users: i64,
    pub reports: i64,
}

impl Database {
    /// Open (creating if missing) the database at `url` and apply migrations.
    pub async fn connect(url: &str, max_connections: u32) -> sqlx::Result<Self> {
        if is_memory_url(url) {
            return Self::in_memory().await;
        }

        if let Some(parent) = file_path(url).and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!(url, max_connections, "Database ready");
        Ok(db)
    }

    /// A private in-memory database. Every pooled connection would get its
    /// own empty database, so the pool is pinned to one connection that
    /// never expires.
    pub async fn in_memory() -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> sqlx::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        let current_version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM _migrations")
                .fetch_one(&self.pool)
                .await?;

        if current_version < 1 {
            self.apply_v1().await?;
        }

        Ok(())
    }

    async fn apply_v1(&self) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO _migrations (version) VALUES (?1)")
            .bind(CURRENT_SCHEMA_VERSION)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(version = CURRENT_SCHEMA_VERSION, "Applied schema migration");
        Ok(())
    }

    pub async fn ping(&self) -> sqlx::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn stats(&self) -> sqlx::Result<IndexStats> {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;
        Ok(IndexStats { users, reports })
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Filesystem path of a `sqlite://` URL, without any query string.
fn file_path(url: &str) -> Option<&Path> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next()?;
    (!path.is_empty()).then(|| Path::new(path))
}
