//! Account service.
//!
//! Email/password registration creates the account with the identity
//! provider and stores an Argon2 hash alongside the profile so the API can
//! check passwords itself. Google sign-in trusts the verified ID token and
//! creates the profile on first login.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use skillx_core::{Collection, Email, EmailError, RecordPath, Role};

use crate::identity::{IdentityError, IdentityProvider, VerifiedIdentity};
use crate::models::User;
use crate::store::{Store, StoreError};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error("an account with this email already exists")]
    EmailTaken,

    /// Wrong password or unknown email.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password hashing error")]
    PasswordHash,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct SignInStamp {
    last_sign_in: chrono::DateTime<Utc>,
}

/// Sign-in stamp plus the profile fields an existing record lacks.
///
/// Only blank fields are filled from token claims; everything else on the
/// stored profile is left alone.
#[derive(Serialize)]
struct SignInFill {
    last_sign_in: chrono::DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
}

impl SignInFill {
    fn missing_from(
        user: &User,
        identity: &VerifiedIdentity,
        now: chrono::DateTime<Utc>,
    ) -> Self {
        let fill = |current: &str, claim: Option<&String>| {
            claim
                .filter(|value| current.is_empty() && !value.is_empty())
                .cloned()
        };
        Self {
            last_sign_in: now,
            email: fill(&user.email, identity.email.as_ref()),
            name: fill(&user.name, identity.name.as_ref()),
            photo_url: fill(&user.photo_url, identity.picture.as_ref()),
        }
    }

    fn apply(&self, user: &mut User) {
        user.last_sign_in = Some(self.last_sign_in);
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(name) = &self.name {
            user.name.clone_from(name);
        }
        if let Some(photo_url) = &self.photo_url {
            user.photo_url.clone_from(photo_url);
        }
    }
}

/// Account operations against the store and identity provider.
pub struct AccountService<'a> {
    store: &'a Store,
    identity: &'a dyn IdentityProvider,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store, identity: &'a dyn IdentityProvider) -> Self {
        Self { store, identity }
    }

    /// Register a new buyer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AccountError` for invalid input, a taken email, or provider and
    /// store failures.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        if name.trim().is_empty() {
            return Err(AccountError::MissingField("name"));
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let uid = self
            .identity
            .create_account(email.as_str(), password, name.trim())
            .await
            .map_err(|e| match e {
                IdentityError::EmailExists => AccountError::EmailTaken,
                other => AccountError::Identity(other),
            })?;

        let user = User {
            uid: uid.clone(),
            name: name.trim().to_string(),
            email: email.into_inner(),
            password: Some(hash_password(password)?),
            verified: false,
            role: Role::Buyer,
            created_at: Utc::now(),
            ..User::default()
        };
        self.store
            .set(&RecordPath::record(Collection::Users, &uid).map_err(invalid_uid)?, &user)
            .await?;

        info!(uid = %uid, "Registered user");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` for an unknown email, an
    /// account without a password, or a wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let email = Email::parse(email).map_err(|_| AccountError::InvalidCredentials)?;
        let mut user = self
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let hash = user
            .password
            .as_deref()
            .ok_or(AccountError::InvalidCredentials)?;
        verify_password(password, hash)?;

        let now = Utc::now();
        let path = RecordPath::record(Collection::Users, &user.uid).map_err(invalid_uid)?;
        self.store
            .update(&path, &SignInStamp { last_sign_in: now })
            .await?;
        user.last_sign_in = Some(now);
        Ok(user)
    }

    /// Load the profile for a verified Google identity, creating it on first login.
    ///
    /// An existing record is never replaced: only its blank email, name and
    /// photo are filled from the token claims.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Store` on store failure.
    #[instrument(skip(self, identity), fields(uid = %identity.uid))]
    pub async fn google_sign_in(&self, identity: &VerifiedIdentity) -> Result<User, AccountError> {
        let path = RecordPath::record(Collection::Users, &identity.uid).map_err(invalid_uid)?;
        let now = Utc::now();

        match self.store.get::<User>(&path).await? {
            Some(mut user) => {
                let fill = SignInFill::missing_from(&user, identity, now);
                self.store.update(&path, &fill).await?;
                fill.apply(&mut user);
                if user.uid.as_str().is_empty() {
                    user.uid = identity.uid.clone();
                }
                Ok(user)
            }
            None => {
                let user = User {
                    uid: identity.uid.clone(),
                    name: identity.name.clone().unwrap_or_default(),
                    email: identity.email.clone().unwrap_or_default(),
                    photo_url: identity.picture.clone().unwrap_or_default(),
                    role: Role::Buyer,
                    created_at: now,
                    last_sign_in: Some(now),
                    ..User::default()
                };
                self.store.set(&path, &user).await?;
                info!("Created user from Google sign-in");
                Ok(user)
            }
        }
    }

    /// First user whose stored email equals `email`.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let matches: Vec<(String, User)> = self
            .store
            .find_by_child(
                &RecordPath::collection(Collection::Users),
                "email",
                email.as_str(),
            )
            .await?;
        Ok(matches.into_iter().next().map(|(_, user)| user))
    }
}

fn invalid_uid(e: skillx_core::RecordKeyError) -> AccountError {
    AccountError::Identity(IdentityError::InvalidToken(format!("unusable uid: {e}")))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.is_empty() {
        return Err(AccountError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::WeakPassword);
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AccountError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AccountError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AccountError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AccountError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cure-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cure-pass", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-pass", &hash),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_legacy_hash_is_rejected_not_panicking() {
        // Hashes from another scheme do not parse as PHC strings.
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_sign_in_fill_only_touches_blank_fields() {
        let user = User {
            name: "Sally".to_string(),
            ..User::default()
        };
        let identity = VerifiedIdentity {
            uid: skillx_core::UserId::new("sally"),
            email: Some("sally@campus.ac.id".to_string()),
            name: Some("Sally from Google".to_string()),
            picture: None,
        };
        let fill = SignInFill::missing_from(&user, &identity, Utc::now());
        assert_eq!(fill.email.as_deref(), Some("sally@campus.ac.id"));
        assert!(fill.name.is_none());
        assert!(fill.photo_url.is_none());

        let written = serde_json::to_value(&fill).unwrap();
        assert!(written.get("name").is_none());
        assert!(written.get("role").is_none());
    }

    #[test]
    fn test_validate_password() {
        assert!(matches!(
            validate_password(""),
            Err(AccountError::MissingField("password"))
        ));
        assert!(matches!(
            validate_password("short"),
            Err(AccountError::WeakPassword)
        ));
        assert!(validate_password("long-enough").is_ok());
    }
}
