use auth::GoogleIdentity;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use index::{GoogleAccount, User, UserUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::form::Form;

#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub language: Option<String>,
    pub nickname: Option<String>,
    pub phone: Option<String>,
    pub birth_year: Option<String>,
    pub birth_month: Option<String>,
    pub birth_day: Option<String>,
    pub gender: Option<String>,
    pub visit_purpose: Option<String>,
    pub onboarding_completed: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture_url,
            language: user.language,
            nickname: user.nickname,
            phone: user.phone,
            birth_year: user.birth_year,
            birth_month: user.birth_month,
            birth_day: user.birth_day,
            gender: user.gender,
            visit_purpose: user.visit_purpose,
            onboarding_completed: user.onboarding_completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub is_new_user: bool,
    pub user: UserResponse,
}

fn account(identity: GoogleIdentity) -> GoogleAccount {
    GoogleAccount {
        google_id: identity.google_id,
        email: identity.email,
        name: identity.name,
        picture_url: identity.picture_url,
    }
}

async fn sign_in(state: &AppState, google_token: &str) -> Result<User, ApiError> {
    let identity = state
        .verifier
        .verify(google_token)
        .await
        .ok_or_else(|| ApiError::Authentication("Invalid Google token".to_string()))?;

    let (user, created) = state.db.upsert_google_user(&account(identity)).await?;
    info!(user_id = user.id, created, "Google sign-in");
    Ok(user)
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    Ok(TokenResponse {
        access_token: state.sessions.issue(user.id)?,
        token_type: "bearer",
        is_new_user: !user.onboarding_completed,
        user: user.into(),
    })
}

pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GoogleAuthRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = sign_in(&state, &request.token).await?;
    Ok(Json(token_response(&state, user)?))
}

/// Sign in with Google and store the onboarding answers in one step.
pub async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut form = Form::read(multipart).await?;
    let google_token = form
        .text("google_token")
        .ok_or_else(|| ApiError::BadRequest("google_token is required".to_string()))?;

    let profile_image = form.take_file("profile_image");
    if let Some(image) = &profile_image {
        if !image.is_image() {
            return Err(ApiError::BadRequest("Profile image must be an image".to_string()));
        }
        if let Err(e) = ingest::decode_image(&image.bytes) {
            return Err(ApiError::BadRequest(format!("Invalid image file: {e}")));
        }
    }

    let user = sign_in(&state, &google_token).await?;

    let picture_url = match profile_image {
        Some(image) => Some(
            state
                .uploads
                .save_member_image(&image.bytes, image.file_name.as_deref().unwrap_or_default(), user.id)
                .await?,
        ),
        None => None,
    };

    let onboarding = UserUpdate {
        language: form.text("language"),
        phone: form.text("phone"),
        nickname: form.text("nickname"),
        birth_year: form.text("birth_year"),
        birth_month: form.text("birth_month"),
        birth_day: form.text("birth_day"),
        gender: form.text("gender"),
        visit_purpose: form.text("visit_purpose"),
        picture_url,
        ..Default::default()
    };

    let user = state
        .db
        .complete_onboarding(user.id, &onboarding)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(token_response(&state, user)?))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .db
        .update_user(user.id, &update)
        .await?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state.db.delete_user(user.id).await?;
    info!(user_id = user.id, "Deleted user account");
    Ok(StatusCode::NO_CONTENT)
}
