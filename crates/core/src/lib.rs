//! SkillX Core - Shared types library.
//!
//! This crate provides the domain vocabulary used by the SkillX components:
//! - `api` - The HTTP backend serving the marketplace clients
//! - `integration-tests` - End-to-end tests driving the API router in-process
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no record
//! store access, no HTTP clients. Anything that needs to talk to Firebase or
//! the payment gateway lives in the `api` crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, record paths, conversation identity, prices,
//!   emails, statuses and partial-update helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
