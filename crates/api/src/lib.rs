//! SkillX API library.
//!
//! The HTTP backend of the SkillX marketplace as a library, so the router can
//! be driven in-process by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the full application router.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config().cors_origin);

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
