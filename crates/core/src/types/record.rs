//! Record store addressing.
//!
//! The hierarchical store addresses data by slash-delimited paths such as
//! `products/{seller}/{product}`. A [`RecordPath`] is always built from a
//! top-level [`Collection`] followed by validated [`RecordKey`] segments, so a
//! client-supplied id can never escape into a sibling subtree.

use core::fmt;

/// Errors for an invalid key segment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordKeyError {
    #[error("record key cannot be empty")]
    Empty,
    #[error("record key must be at most {max} bytes")]
    TooLong { max: usize },
    #[error("record key contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

/// A single path segment.
///
/// Firebase forbids `.` `#` `$` `[` `]` and `/` (the separator) in keys, as
/// well as ASCII control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    pub const MAX_LENGTH: usize = 768;

    /// Validate a key segment.
    ///
    /// # Errors
    ///
    /// See [`RecordKeyError`].
    pub fn parse(s: &str) -> Result<Self, RecordKeyError> {
        if s.trim().is_empty() {
            return Err(RecordKeyError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(RecordKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| matches!(c, '.' | '#' | '$' | '[' | ']' | '/') || c.is_ascii_control())
        {
            return Err(RecordKeyError::ForbiddenChar(c));
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-level collections of the marketplace tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Majors,
    Categories,
    Services,
    Products,
    Portfolios,
    Messages,
    Conversations,
    RegisterSellers,
    UserSkills,
    Skills,
    Transactions,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Majors => "majors",
            Self::Categories => "categories",
            Self::Services => "services",
            Self::Products => "products",
            Self::Portfolios => "portfolios",
            Self::Messages => "messages",
            Self::Conversations => "conversations",
            Self::RegisterSellers => "registerSellers",
            Self::UserSkills => "user_skills",
            Self::Skills => "skills",
            Self::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated slash-delimited location in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPath {
    collection: Collection,
    keys: Vec<RecordKey>,
}

impl RecordPath {
    /// The root of a collection.
    #[must_use]
    pub const fn collection(collection: Collection) -> Self {
        Self {
            collection,
            keys: Vec::new(),
        }
    }

    /// Append one key segment.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordKeyError`] if `key` is not a legal segment.
    pub fn child(mut self, key: impl AsRef<str>) -> Result<Self, RecordKeyError> {
        self.keys.push(RecordKey::parse(key.as_ref())?);
        Ok(self)
    }

    /// Shorthand for `collection(c).child(key)`.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordKeyError`] if `key` is not a legal segment.
    pub fn record(collection: Collection, key: impl AsRef<str>) -> Result<Self, RecordKeyError> {
        Self::collection(collection).child(key)
    }

    /// Shorthand for a two-level record such as `products/{seller}/{product}`.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordKeyError`] if either key is not a legal segment.
    pub fn nested(
        collection: Collection,
        parent: impl AsRef<str>,
        key: impl AsRef<str>,
    ) -> Result<Self, RecordKeyError> {
        Self::record(collection, parent)?.child(key)
    }

    #[must_use]
    pub const fn root(&self) -> Collection {
        self.collection
    }

    /// Number of key segments below the collection.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    /// The key segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.collection.as_str()).chain(self.keys.iter().map(RecordKey::as_str))
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection.as_str())?;
        for key in &self.keys {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_paths() {
        let path = RecordPath::nested(Collection::Products, "seller-1", "p-9").unwrap();
        assert_eq!(path.to_string(), "products/seller-1/p-9");
        assert_eq!(path.depth(), 2);
        assert_eq!(
            RecordPath::collection(Collection::RegisterSellers).to_string(),
            "registerSellers"
        );
    }

    #[test]
    fn test_rejects_traversal() {
        assert_eq!(
            RecordPath::record(Collection::Users, "a/b"),
            Err(RecordKeyError::ForbiddenChar('/'))
        );
        assert_eq!(
            RecordKey::parse("x.y"),
            Err(RecordKeyError::ForbiddenChar('.'))
        );
        assert_eq!(RecordKey::parse(""), Err(RecordKeyError::Empty));
        assert!(RecordKey::parse(&"k".repeat(769)).is_err());
    }

    #[test]
    fn test_segments() {
        let path = RecordPath::nested(Collection::UserSkills, "u1", "s1").unwrap();
        let segments: Vec<&str> = path.segments().collect();
        assert_eq!(segments, ["user_skills", "u1", "s1"]);
    }
}
