//! Portfolio entries (`portfolios/{uid}/{id}`).

use serde::{Deserialize, Serialize};

use skillx_core::{PortfolioId, UserId};

/// A project, certificate or work history entry on a user's profile.
///
/// Dates are free-form strings as entered by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub link: String,
    pub photo: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub date_created: String,
    pub date_end: String,
    pub is_present: bool,
}
