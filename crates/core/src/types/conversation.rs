//! Two-party conversation identity.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationIdError {
    #[error("participant id cannot be empty")]
    EmptyParticipant,
    #[error("a conversation needs two distinct participants")]
    SameParticipant,
}

/// Key of the conversation between two users.
///
/// Derived from the participant ids so both sides arrive at the same key
/// without a lookup: the byte-wise smaller id, an underscore, then the larger.
///
/// ```
/// use skillx_core::{ConversationId, UserId};
///
/// let a = UserId::new("alice");
/// let b = UserId::new("bob");
/// let ab = ConversationId::derive(&a, &b).unwrap();
/// assert_eq!(ab, ConversationId::derive(&b, &a).unwrap());
/// assert_eq!(ab.as_str(), "alice_bob");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Derive the canonical key for the pair `(a, b)`.
    ///
    /// # Errors
    ///
    /// Rejects blank ids and a user paired with themselves.
    pub fn derive(a: &UserId, b: &UserId) -> Result<Self, ConversationIdError> {
        if a.is_blank() || b.is_blank() {
            return Err(ConversationIdError::EmptyParticipant);
        }
        if a == b {
            return Err(ConversationIdError::SameParticipant);
        }

        let (low, high) = if a.as_str() < b.as_str() { (a, b) } else { (b, a) };
        Ok(Self(format!("{low}_{high}")))
    }

    /// Wrap a key received from a client (e.g. a path parameter).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
