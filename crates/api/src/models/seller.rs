//! Seller applications (`registerSellers/{uid}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillx_core::{SellerStatus, UserId};

/// A user's request to sell, reviewed by an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterSeller {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub organization: String,
    /// Major title as registered in `majors`.
    pub major: String,
    /// Student id card photo.
    pub photo_url: String,
    pub status: SellerStatus,
    pub verified: bool,
    pub graduation_month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    pub about_me: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
