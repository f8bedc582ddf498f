use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
/// Unknown key ids cannot force a refetch more often than this.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const CLOCK_SKEW_SECS: u64 = 60;

/// The verified identity carried by a Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub google_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `None` for any token that does not verify.
    async fn verify(&self, token: &str) -> Option<GoogleIdentity>;
}

#[derive(Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct GoogleClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn fresh_key(&self, kid: &str) -> Option<DecodingKey> {
        let fresh = self.fetched_at.is_some_and(|at| at.elapsed() < KEY_CACHE_TTL);
        if fresh { self.keys.get(kid).cloned() } else { None }
    }

    fn fetched_within(&self, interval: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < interval)
    }
}

/// Verifies Google ID tokens against Google's published signing keys.
pub struct GoogleVerifier {
    client_id: Option<String>,
    certs_url: String,
    client: reqwest::Client,
    refresh_interval: Duration,
    cache: RwLock<KeyCache>,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client_id: client_id.filter(|id| !id.trim().is_empty()),
            certs_url: GOOGLE_CERTS_URL.to_string(),
            client: reqwest::Client::new(),
            refresh_interval: MIN_REFRESH_INTERVAL,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    pub fn with_certs_url(mut self, certs_url: String) -> Self {
        self.certs_url = certs_url;
        self
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, DecodingKey>> {
        let set: JwkSet = self
            .client
            .get(&self.certs_url)
            .send()
            .await
            .context("Failed to fetch Google signing keys")?
            .error_for_status()
            .context("Google signing keys request failed")?
            .json()
            .await
            .context("Failed to parse Google signing keys")?;

        let mut keys = HashMap::new();
        for jwk in set.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, error = %e, "Skipping malformed signing key"),
            }
        }
        Ok(keys)
    }

    /// Cached key for `kid`; an unknown kid or a stale cache triggers a refetch,
    /// at most once per refresh interval.
    async fn key_for(&self, kid: &str) -> Result<DecodingKey> {
        if let Some(key) = self.cache.read().await.fresh_key(kid) {
            return Ok(key);
        }

        // Fetches are serialised behind the write lock.
        let mut cache = self.cache.write().await;
        if let Some(key) = cache.fresh_key(kid) {
            return Ok(key);
        }
        if cache.fetched_within(self.refresh_interval) && cache.fetched_within(KEY_CACHE_TTL) {
            anyhow::bail!("Unknown signing key: {kid}");
        }

        cache.keys = self.fetch_keys().await?;
        cache.fetched_at = Some(Instant::now());
        info!(count = cache.keys.len(), "Refreshed Google signing keys");

        cache
            .keys
            .get(kid)
            .cloned()
            .context(format!("Unknown signing key: {kid}"))
    }

    async fn verify_token(&self, token: &str, client_id: &str) -> Result<GoogleIdentity> {
        let header = decode_header(token).context("Malformed token header")?;
        let kid = header.kid.context("Token header has no key id")?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_SECS;
        validation.set_audience(&[client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleClaims>(token, &key, &validation)
            .context("Token failed validation")?
            .claims;

        Ok(GoogleIdentity {
            google_id: claims.sub,
            email: claims.email,
            name: claims.name,
            picture_url: claims.picture,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, token: &str) -> Option<GoogleIdentity> {
        let Some(client_id) = self.client_id.as_deref() else {
            error!("GOOGLE_CLIENT_ID not configured");
            return None;
        };

        match self.verify_token(token, client_id).await {
            Ok(identity) => {
                debug!(token_len = token.len(), "Google token verified");
                Some(identity)
            }
            Err(e) => {
                warn!(token_len = token.len(), error = %e, "Google token rejected");
                None
            }
        }
    }
}
