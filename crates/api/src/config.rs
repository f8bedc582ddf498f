use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9090";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/intake.db";
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthConfig {
    pub google_client_id: Option<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: String,
    pub vision_model: String,
    pub text_model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub upload_dir: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: DEFAULT_BIND_ADDR.to_string(),
                cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                google_client_id: None,
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                jwt_expire_minutes: auth::session::DEFAULT_EXPIRE_MINUTES,
            },
            llm: LlmConfig {
                api_key: None,
                api_url: extract::llm::DEFAULT_BASE_URL.to_string(),
                vision_model: extract::llm::DEFAULT_VISION_MODEL.to_string(),
                text_model: extract::llm::DEFAULT_TEXT_MODEL.to_string(),
            },
            storage: StorageConfig {
                upload_dir: "uploads".to_string(),
            },
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or empty keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                bind_addr: get("BIND_ADDR").unwrap_or(defaults.server.bind_addr),
                cors_origin: get("CORS_ORIGIN").unwrap_or(defaults.server.cors_origin),
                max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), defaults.server.max_upload_bytes),
            },
            database: DatabaseConfig {
                url: get("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    defaults.database.max_connections,
                ),
            },
            auth: AuthConfig {
                google_client_id: get("GOOGLE_CLIENT_ID"),
                jwt_secret: get("JWT_SECRET").unwrap_or(defaults.auth.jwt_secret),
                jwt_expire_minutes: parse_or(
                    "JWT_EXPIRE_MINUTES",
                    get("JWT_EXPIRE_MINUTES"),
                    defaults.auth.jwt_expire_minutes,
                ),
            },
            llm: LlmConfig {
                api_key: get("GROQ_API_KEY"),
                api_url: get("GROQ_API_URL").unwrap_or(defaults.llm.api_url),
                vision_model: get("GROQ_VISION_MODEL").unwrap_or(defaults.llm.vision_model),
                text_model: get("GROQ_TEXT_MODEL").unwrap_or(defaults.llm.text_model),
            },
            storage: StorageConfig {
                upload_dir: get("UPLOAD_DIR").unwrap_or(defaults.storage.upload_dir),
            },
            log_format: match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value.map(|v| v.trim().parse::<T>()) {
        Some(Ok(parsed)) => parsed,
        Some(Err(e)) => {
            warn!(key, error = %e, default = %default, "Invalid config value, using default");
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.server.bind_addr, "0.0.0.0:9090");
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.database.url, "sqlite://data/intake.db");
        assert_eq!(config.auth.jwt_expire_minutes, 10080);
        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.llm.api_key.is_none());
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1:8000"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRE_MINUTES", "30"),
            ("GROQ_API_KEY", "gsk_test"),
            ("GOOGLE_CLIENT_ID", "abc.apps.googleusercontent.com"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.auth.jwt_expire_minutes, 30);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.uses_default_secret());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config(&[("MAX_UPLOAD_BYTES", "lots"), ("DATABASE_MAX_CONNECTIONS", "")]);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_secrets_not_serialized() {
        let json = serde_json::to_string(&config(&[("JWT_SECRET", "hunter2"), ("GROQ_API_KEY", "gsk")])).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("gsk"));
    }
}
