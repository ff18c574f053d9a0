//! Business logic shared by several route handlers.
//!
//! # Services
//!
//! - `taxonomy` - Major/category/service resolution and membership checks
//! - `accounts` - Registration, password login and Google sign-in upsert
//! - `catalog` - Product creation and update validation
//! - `chat` - Chatroom creation and message delivery
//! - `checkout` - Price arithmetic and payment session creation

pub mod accounts;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod taxonomy;

pub use accounts::{AccountError, AccountService};
pub use catalog::{CatalogError, CatalogService, NewProduct, ProductPatch};
pub use chat::{ChatError, ChatService, MessagePatch, OutgoingMessage};
pub use checkout::{CheckoutError, CheckoutService, NewTransaction};
pub use taxonomy::{TaxonomyError, TaxonomyResolver};
