//! Authentication extractors.
//!
//! Every protected route takes the caller as an explicit extractor argument.
//! The bearer token is verified against the identity provider on each request;
//! there is no session.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use skillx_core::{Collection, RecordPath, Role};

use crate::error::{AppError, set_sentry_user};
use crate::identity::{IdentityError, VerifiedIdentity};
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <id token>` header.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(caller): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", caller.uid)
/// }
/// ```
pub struct RequireAuth(pub VerifiedIdentity);

/// Extractor that requires an authenticated caller whose stored role is `admin`.
pub struct RequireAdmin(pub User);

/// Error returned when a protected route is called without a usable identity.
#[derive(Debug)]
pub enum AuthRejection {
    /// No bearer token in the request.
    MissingToken,
    /// The token did not verify.
    InvalidToken,
    /// Authenticated, but not an admin.
    NotAdmin,
    /// Verifying or looking up the caller failed upstream.
    Lookup(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Missing or invalid token"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid ID Token"),
            Self::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::Lookup(err) => return err.into_response(),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// The token part of a `Bearer` authorization header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthRejection::MissingToken)?;

        let identity = state
            .identity()
            .verify(token)
            .await
            .map_err(|e| match e {
                IdentityError::InvalidToken(_) => {
                    tracing::debug!(error = %e, "Rejected ID token");
                    AuthRejection::InvalidToken
                }
                upstream => AuthRejection::Lookup(upstream.into()),
            })?;

        set_sentry_user(&identity.uid, identity.email.as_deref());
        Ok(Self(identity))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;

        let path = RecordPath::record(Collection::Users, &identity.uid)
            .map_err(|_| AuthRejection::NotAdmin)?;
        let user: User = state
            .store()
            .get(&path)
            .await
            .map_err(|e| AuthRejection::Lookup(e.into()))?
            .ok_or(AuthRejection::NotAdmin)?;

        if user.role != Role::Admin {
            return Err(AuthRejection::NotAdmin);
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(value) {
            headers.insert(AUTHORIZATION, v);
        }
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rejection_status() {
        assert_eq!(
            AuthRejection::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::NotAdmin.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
