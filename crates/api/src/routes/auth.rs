//! Authentication route handlers.
//!
//! Email/password accounts are created with the identity provider and checked
//! locally on login. Google accounts arrive with an ID token and get a profile
//! on first sign-in.

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::middleware::bearer_token;
use crate::routes::{ApiJson, ApiResponse, created, ok_with_message};
use crate::services::AccountService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth/register
///
/// # Errors
///
/// 422 for a missing field, 400 for an invalid email or short password,
/// 409 when the email is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<Value>> {
    if body.email.trim().is_empty() {
        return Err(AppError::MissingField("email"));
    }
    let user = AccountService::new(state.store(), state.identity())
        .register(&body.name, &body.email, &body.password)
        .await?;

    Ok(created(
        "User registered successfully.",
        json!({ "uid": user.uid }),
    ))
}

/// POST /auth/login
///
/// # Errors
///
/// 401 for an unknown email or wrong password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiResponse<Value>> {
    let user = AccountService::new(state.store(), state.identity())
        .login(&body.email, &body.password)
        .await?;

    tracing::info!(uid = %user.uid, "Email login");
    Ok(ok_with_message("Login successful", json!({ "uid": user.uid })))
}

/// POST /login/google
///
/// The ID token comes in the `Authorization: Bearer` header.
///
/// # Errors
///
/// 400 without a token, 401 when it does not verify.
pub async fn google(State(state): State<AppState>, headers: HeaderMap) -> Result<ApiResponse<Value>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::BadRequest("ID Token is required".to_string()))?;
    let identity = state.identity().verify(token).await?;

    let user = AccountService::new(state.store(), state.identity())
        .google_sign_in(&identity)
        .await?;

    Ok(ok_with_message(
        "Login successful",
        json!({
            "user": {
                "uid": user.uid,
                "name": user.name,
                "email": user.email,
                "photoURL": user.photo_url,
            },
            "token": token,
        }),
    ))
}
