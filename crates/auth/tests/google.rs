use auth::{GoogleVerifier, IdentityVerifier};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::json;
use std::time::Duration;

const PRIVATE_KEY: &str = include_str!("fixtures/test_rsa.pem");
const MODULUS: &str = include_str!("fixtures/test_rsa.n");
const CLIENT_ID: &str = "test-client.apps.googleusercontent.com";

fn jwks(kid: &str) -> String {
    json!({"keys": [{"kty": "RSA", "alg": "RS256", "use": "sig", "kid": kid, "n": MODULUS.trim(), "e": "AQAB"}]})
        .to_string()
}

fn id_token(kid: &str, claims: serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
    encode(&header, &claims, &key).unwrap()
}

fn claims(aud: &str, iss: &str) -> serde_json::Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": "1234567890",
        "email": "patient@example.com",
        "name": "Lee Jiwoo",
        "picture": "https://lh3.googleusercontent.com/a/pic",
        "aud": aud,
        "iss": iss,
        "iat": now,
        "exp": now + 3600,
    })
}

#[tokio::test]
async fn test_verifies_google_token() {
    let mut server = mockito::Server::new_async().await;
    let certs = server
        .mock("GET", "/certs")
        .with_header("content-type", "application/json")
        .with_body(jwks("key-1"))
        .expect(1)
        .create_async()
        .await;

    let verifier = GoogleVerifier::new(Some(CLIENT_ID.to_string()))
        .with_certs_url(format!("{}/certs", server.url()));

    let token = id_token("key-1", claims(CLIENT_ID, "https://accounts.google.com"));
    let identity = verifier.verify(&token).await.unwrap();
    assert_eq!(identity.google_id, "1234567890");
    assert_eq!(identity.email.as_deref(), Some("patient@example.com"));
    assert_eq!(identity.picture_url.as_deref(), Some("https://lh3.googleusercontent.com/a/pic"));

    // second verification is served from the key cache
    let token = id_token("key-1", claims(CLIENT_ID, "accounts.google.com"));
    assert!(verifier.verify(&token).await.is_some());
    certs.assert_async().await;
}

#[tokio::test]
async fn test_rejects_wrong_audience_and_issuer() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/certs")
        .with_body(jwks("key-1"))
        .create_async()
        .await;

    let verifier = GoogleVerifier::new(Some(CLIENT_ID.to_string()))
        .with_certs_url(format!("{}/certs", server.url()));

    let token = id_token("key-1", claims("someone-else", "https://accounts.google.com"));
    assert!(verifier.verify(&token).await.is_none());

    let token = id_token("key-1", claims(CLIENT_ID, "https://evil.example.com"));
    assert!(verifier.verify(&token).await.is_none());
}

#[tokio::test]
async fn test_rejects_expired_token() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/certs")
        .with_body(jwks("key-1"))
        .create_async()
        .await;

    let verifier = GoogleVerifier::new(Some(CLIENT_ID.to_string()))
        .with_certs_url(format!("{}/certs", server.url()));

    let mut expired = claims(CLIENT_ID, "accounts.google.com");
    expired["exp"] = json!(Utc::now().timestamp() - 120);
    assert!(verifier.verify(&id_token("key-1", expired)).await.is_none());

    let mut skewed = claims(CLIENT_ID, "accounts.google.com");
    skewed["exp"] = json!(Utc::now().timestamp() - 10);
    assert!(verifier.verify(&id_token("key-1", skewed)).await.is_some());
}

#[tokio::test]
async fn test_unknown_kid_refreshes_keys() {
    let mut server = mockito::Server::new_async().await;
    let certs = server
        .mock("GET", "/certs")
        .with_body(jwks("key-1"))
        .expect(2)
        .create_async()
        .await;

    let verifier = GoogleVerifier::new(Some(CLIENT_ID.to_string()))
        .with_certs_url(format!("{}/certs", server.url()))
        .with_refresh_interval(Duration::ZERO);

    assert!(verifier.verify(&id_token("key-1", claims(CLIENT_ID, "accounts.google.com"))).await.is_some());
    assert!(verifier.verify(&id_token("rotated", claims(CLIENT_ID, "accounts.google.com"))).await.is_none());
    certs.assert_async().await;
}

#[tokio::test]
async fn test_unknown_kids_do_not_refetch_within_interval() {
    let mut server = mockito::Server::new_async().await;
    let certs = server
        .mock("GET", "/certs")
        .with_body(jwks("key-1"))
        .expect(1)
        .create_async()
        .await;

    let verifier = GoogleVerifier::new(Some(CLIENT_ID.to_string()))
        .with_certs_url(format!("{}/certs", server.url()));

    assert!(verifier.verify(&id_token("key-1", claims(CLIENT_ID, "accounts.google.com"))).await.is_some());
    for kid in ["forged-1", "forged-2", "forged-3"] {
        assert!(verifier.verify(&id_token(kid, claims(CLIENT_ID, "accounts.google.com"))).await.is_none());
    }
    // known keys keep verifying from the cache
    assert!(verifier.verify(&id_token("key-1", claims(CLIENT_ID, "accounts.google.com"))).await.is_some());
    certs.assert_async().await;
}
