//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillx_core::{Role, UserId};

/// A marketplace user as stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub organization: String,
    /// Major title, not id.
    pub major: String,
    pub language: String,
    /// Argon2 PHC string for email/password accounts. Never leaves the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub photo_url: String,
    pub verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sign_in: Option<DateTime<Utc>>,
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub organization: String,
    pub major: String,
    pub language: String,
    pub photo_url: String,
    pub verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sign_in: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            name: user.name,
            email: user.email,
            organization: user.organization,
            major: user.major,
            language: user.language,
            photo_url: user.photo_url,
            verified: user.verified,
            role: user.role,
            created_at: user.created_at,
            last_sign_in: user.last_sign_in,
        }
    }
}
