//! Newtype IDs for type-safe record references.
//!
//! Every record in the store is addressed by an opaque string key. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different collections.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Default`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Constructors: `new()`, `generate()` (UUID v4)
/// - Accessors: `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>`, `From<String>` and `From<&str>`
///
/// # Example
///
/// ```rust
/// # use skillx_core::define_id;
/// define_id!(UserId);
/// define_id!(ProductId);
///
/// let user_id = UserId::new("u-1");
/// let product_id = ProductId::generate();
///
/// // These are different types, so this won't compile:
/// // let _: UserId = product_id;
/// # let _ = (user_id, product_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing key.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random key (hyphenated UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Get the underlying key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the key is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(MajorId);
define_id!(CategoryId);
define_id!(ServiceId);
define_id!(ProductId);
define_id!(PortfolioId);
define_id!(MessageId);
define_id!(TransactionId);
define_id!(SkillId);
