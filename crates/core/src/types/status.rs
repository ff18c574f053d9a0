//! Status enums for users, seller applications and transactions.

use serde::{Deserialize, Serialize};

/// Marketplace role of a user.
///
/// Records written by older clients may carry arbitrary casing or unknown
/// strings; anything unrecognized reads as [`Role::Buyer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "seller" => Self::Seller,
            "admin" => Self::Admin,
            _ => Self::Buyer,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role a user may switch themselves to. Admin is assigned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfAssignableRole {
    Buyer,
    Seller,
}

impl From<SelfAssignableRole> for Role {
    fn from(role: SelfAssignableRole) -> Self {
        match role {
            SelfAssignableRole::Buyer => Self::Buyer,
            SelfAssignableRole::Seller => Self::Seller,
        }
    }
}

/// Review state of a seller application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SellerStatus {
    #[default]
    Pending,
    Accepted,
    Denied,
}

/// Decision an admin can record on a seller application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerDecision {
    Accepted,
    Denied,
}

impl From<SellerDecision> for SellerStatus {
    fn from(decision: SellerDecision) -> Self {
        match decision {
            SellerDecision::Accepted => Self::Accepted,
            SellerDecision::Denied => Self::Denied,
        }
    }
}

/// Payment state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
}
