//! CORS policy for the mobile/web client.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

/// Header the client sends alongside `Authorization` on some calls.
const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

/// Allow exactly one origin with the methods and headers the client uses.
///
/// An origin that is not a valid header value falls back to allowing none,
/// which leaves same-origin requests working.
#[must_use]
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            X_AUTH_TOKEN,
        ]);

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "Ignoring invalid CORS origin");
            layer
        }
    }
}
