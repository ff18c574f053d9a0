//! Core types for SkillX.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod conversation;
pub mod email;
pub mod id;
pub mod patch;
pub mod price;
pub mod record;
pub mod status;
pub mod title;

pub use conversation::{ConversationId, ConversationIdError};
pub use email::{Email, EmailError};
pub use id::*;
pub use patch::{apply_nonblank, apply_present};
pub use price::{CurrencyCode, Price, PriceError};
pub use record::{Collection, RecordKey, RecordKeyError, RecordPath};
pub use status::*;
pub use title::{normalize_title, titles_match, titles_match_ignore_case};
