//! Record shapes stored in the hierarchical store.
//!
//! JSON field names follow what the mobile clients already read and write
//! (`nameProduct`, `photo_url`, `senderID`, ...), so the serde renames here
//! are part of the wire contract. Records are decoded leniently: missing
//! fields fall back to defaults because older clients wrote partial records.

pub mod message;
pub mod portfolio;
pub mod product;
pub mod seller;
pub mod skill;
pub mod taxonomy;
pub mod transaction;
pub mod user;

pub use message::{Conversation, LastMessage, Message};
pub use portfolio::Portfolio;
pub use product::Product;
pub use seller::RegisterSeller;
pub use skill::{Skill, UserSkill};
pub use taxonomy::{Category, Major, Service};
pub use transaction::Transaction;
pub use user::{User, UserView};
