use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPIRE_MINUTES: i64 = 60 * 24 * 7;

/// Claims of the bearer tokens we issue after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, expire_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(expire_minutes),
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign session token")
    }

    /// Validate a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .context("Invalid session token")?;
        data.claims
            .sub
            .parse()
            .context("Invalid user ID in token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new("secret", DEFAULT_EXPIRE_MINUTES);
        let token = keys.issue(42).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = SessionKeys::new("one", 60).issue(1).unwrap();
        assert!(SessionKeys::new("two", 60).verify(&token).is_err());
        assert!(SessionKeys::new("one", 60).verify("not-a-token").is_err());
    }

    #[test]
    fn test_rejects_expired() {
        // past the default 60s leeway
        let keys = SessionKeys::new("secret", -5);
        let token = keys.issue(1).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_subject() {
        let keys = SessionKeys::new("secret", 60);
        let now = Utc::now().timestamp();
        let claims = Claims { sub: "abc".to_string(), iat: now, exp: now + 60 };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
