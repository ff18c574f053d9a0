//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error leaves as `{"success": false, "error": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use skillx_core::{ConversationIdError, RecordKeyError};

use crate::identity::IdentityError;
use crate::payments::PaymentError;
use crate::services::{AccountError, CatalogError, ChatError, CheckoutError, TaxonomyError};
use crate::store::StoreError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Record store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider call failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Payment gateway call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or semantically invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// A required field is absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The record already exists.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Payment(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Identity(err) => match err {
                IdentityError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                IdentityError::EmailExists => StatusCode::CONFLICT,
                IdentityError::Rejected(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn public_message(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Payment(_) => "Failed to create transaction with payment gateway".to_string(),
            Self::Identity(err) => match err {
                IdentityError::InvalidToken(_) => "Invalid or expired token".to_string(),
                IdentityError::EmailExists => {
                    "An account with this email already exists".to_string()
                }
                IdentityError::Rejected(reason) => reason.clone(),
                _ => "Authentication service error".to_string(),
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "success": false, "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        Self::BadRequest("Invalid input".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<RecordKeyError> for AppError {
    fn from(err: RecordKeyError) -> Self {
        Self::BadRequest(format!("Invalid identifier: {err}"))
    }
}

impl From<ConversationIdError> for AppError {
    fn from(err: ConversationIdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<TaxonomyError> for AppError {
    fn from(err: TaxonomyError) -> Self {
        match err {
            TaxonomyError::Store(e) => Self::Store(e),
            not_found => Self::NotFound(not_found.to_string()),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidEmail(_) | AccountError::WeakPassword => {
                Self::BadRequest(err.to_string())
            }
            AccountError::MissingField(field) => Self::MissingField(field),
            AccountError::EmailTaken => Self::Conflict(
                "An account with this email already exists".to_string(),
            ),
            AccountError::InvalidCredentials => {
                Self::Unauthorized("Invalid email or password".to_string())
            }
            AccountError::PasswordHash => Self::Internal(err.to_string()),
            AccountError::Identity(e) => Self::Identity(e),
            AccountError::Store(e) => Self::Store(e),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingField(field) => Self::MissingField(field),
            CatalogError::NotASeller => Self::Forbidden(err.to_string()),
            CatalogError::ProductNotFound => Self::NotFound(err.to_string()),
            CatalogError::SellerMajorUnknown(_)
            | CatalogError::CategoryOutsideMajor
            | CatalogError::ServiceOutsideCategory => Self::BadRequest(err.to_string()),
            CatalogError::Taxonomy(e) => e.into(),
            CatalogError::Store(e) => Self::Store(e),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidPair(e) => e.into(),
            ChatError::MissingField(field) => Self::MissingField(field),
            ChatError::ReceiverNotFound
            | ChatError::ConversationNotFound
            | ChatError::MessageNotFound => Self::NotFound(err.to_string()),
            ChatError::NotParticipant | ChatError::NotSender | ChatError::NotReceiver => {
                Self::Forbidden(err.to_string())
            }
            // The chatroom handler answers this one itself so it can echo the id.
            ChatError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            ChatError::Store(e) => Self::Store(e),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::MissingField(field) => Self::MissingField(field),
            CheckoutError::InvalidQuantity => Self::BadRequest(err.to_string()),
            CheckoutError::ProductNotFound | CheckoutError::BuyerNotFound => {
                Self::NotFound(err.to_string())
            }
            CheckoutError::PriceMissing => Self::BadRequest(err.to_string()),
            CheckoutError::Price(_) => Self::Internal(err.to_string()),
            CheckoutError::Payment(e) => Self::Payment(e),
            CheckoutError::Store(e) => Self::Store(e),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Reject a missing or blank required text field.
///
/// # Errors
///
/// Returns [`AppError::MissingField`] naming `field`.
pub fn require(field: &'static str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AppError::MissingField(field)),
    }
}

/// Set the Sentry user context from a user ID.
///
/// Called by the auth extractor so errors are associated with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("Product not found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("no".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::MissingField("title")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Conflict("exists".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::InvalidToken(
                "expired".to_string()
            ))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Backend("boom".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Store(StoreError::Backend("permission denied at /users".into()));
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_require() {
        assert!(require("title", Some("Design")).is_ok());
        assert!(matches!(
            require("title", Some("   ")),
            Err(AppError::MissingField("title"))
        ));
        assert!(matches!(
            require("photo_url", None),
            Err(AppError::MissingField("photo_url"))
        ));
    }
}
