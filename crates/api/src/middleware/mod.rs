//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS (single configured origin)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: protected handlers take [`RequireAuth`] or
//! [`RequireAdmin`] as an argument.

pub mod auth;
pub mod cors;
pub mod request_id;

pub use auth::{AuthRejection, RequireAdmin, RequireAuth, bearer_token};
pub use cors::cors_layer;
pub use request_id::request_id_middleware;
