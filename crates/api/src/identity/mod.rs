//! External identity verification.
//!
//! Callers present a Firebase Authentication ID token as a bearer credential.
//! [`IdentityProvider`] is the seam handlers and the auth extractor depend
//! on; [`FirebaseIdentity`] is the production implementation.

mod firebase;

pub use firebase::FirebaseIdentity;

use async_trait::async_trait;
use thiserror::Error;

use skillx_core::UserId;

/// Errors that can occur when verifying tokens or creating accounts.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is malformed, expired, or not signed for this project.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Account creation failed because the email is taken.
    #[error("email already registered")]
    EmailExists,

    /// The provider refused the request for a client-side reason.
    #[error("{0}")]
    Rejected(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something unexpected.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Claims extracted from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies bearer credentials and manages provider-side accounts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate an ID token and return the subject it names.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;

    /// Create an email/password account and return its uid.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserId, IdentityError>;
}
