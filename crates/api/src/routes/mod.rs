//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//!
//! # Auth
//! POST /auth/register                       - Email/password registration
//! POST /auth/login                          - Email/password login
//! POST /login/google                        - Google sign-in (bearer ID token)
//!
//! # Users (requires auth)
//! GET  /user?uid=                           - Profile with resolved major
//! PUT  /user/update                         - Partial profile update
//! POST /user/change-role                    - Switch between buyer and seller
//! GET  /users/search?query=                 - Search users by name
//! GET  /users/{uid}/portfolios              - Another user's portfolio
//! GET  /user/skills                         - Caller's skills
//! POST /user/skills                         - Attach a skill to the caller
//!
//! # Sellers (requires auth)
//! POST /user/request-seller                 - Apply to become a seller
//! GET  /user/request-seller-status          - Application status
//! GET  /user/seller-data                    - Profile plus application
//! PUT  /user/about-me                       - Update the application's about text
//! GET  /sellers                             - Every application
//! POST /admin/verify-seller                 - Accept or deny (admin)
//!
//! # Portfolios (requires auth)
//! GET  /user/portfolios                     - Caller's portfolio
//! POST /user/portfolios                     - Add an entry
//! PUT  /user/portfolios/{id}                - Partial update
//! DELETE /user/portfolios/{id}              - Remove an entry
//!
//! # Taxonomy (reads require auth, writes require admin)
//! GET  /majors                 POST /majors
//! GET  /majors/{id}            DELETE /majors/{id}
//! GET  /categories             POST /categories
//! GET  /categories/{id}        PUT|DELETE /categories/{id}
//! GET  /services               POST /services
//! GET  /services/by-title?title=
//! GET  /services/{id}          PUT|DELETE /services/{id}
//!
//! # Skills (reads public, writes require admin)
//! GET  /skills                 POST /skills
//! GET  /skills/{id}            PUT|DELETE /skills/{id}
//!
//! # Products
//! GET  /products                            - Caller's products (auth)
//! POST /products                            - Create (auth, seller taxonomy)
//! PUT  /products/{id}                       - Partial update (auth)
//! DELETE /products/{id}                     - Delete (auth)
//! GET  /products/view?seller=&product=      - By seller name and product name (auth)
//! GET  /products/search?query=              - Public search
//!
//! # Messaging (requires auth)
//! GET  /conversations                       - Caller's conversations
//! POST /conversations                       - Create chatroom (409 if it exists)
//! POST /messages                            - Send a message
//! GET  /conversations/{id}/messages         - Messages of a conversation
//! GET|PUT|DELETE /conversations/{id}/messages/{message_id}
//!
//! # Transactions (requires auth)
//! POST /transactions                        - Start a checkout
//! GET  /transactions                        - Caller's transactions
//!
//! # Search
//! GET  /search?query=                       - Users and products (public)
//! ```

pub mod auth;
pub mod categories;
pub mod majors;
pub mod messages;
pub mod offerings;
pub mod portfolios;
pub mod products;
pub mod search;
pub mod sellers;
pub mod skills;
pub mod transactions;
pub mod users;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

// =============================================================================
// Extractors and envelope
// =============================================================================

/// JSON body extractor whose rejection is an [`AppError`] (400 "Invalid input").
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Success envelope: `{"success": true, "message"?: ..., "data"?: ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Handler return type for enveloped responses.
pub type ApiResponse<T> = (StatusCode, Json<Envelope<T>>);

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> ApiResponse<T> {
    respond(StatusCode::OK, None, Some(data))
}

/// 201 with `data` and a message.
pub fn created<T: Serialize>(message: &str, data: T) -> ApiResponse<T> {
    respond(StatusCode::CREATED, Some(message), Some(data))
}

/// 200 with `data` and a message.
pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> ApiResponse<T> {
    respond(StatusCode::OK, Some(message), Some(data))
}

/// 200 with only a message.
pub fn done(message: &str) -> ApiResponse<()> {
    respond(StatusCode::OK, Some(message), None)
}

fn respond<T: Serialize>(status: StatusCode, message: Option<&str>, data: Option<T>) -> ApiResponse<T> {
    (
        status,
        Json(Envelope {
            success: status.is_success(),
            message: message.map(String::from),
            data,
        }),
    )
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the `/user` routes router (the caller's own data).
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::show))
        .route("/update", put(users::update))
        .route("/change-role", post(users::change_role))
        .route("/skills", get(skills::mine).post(skills::attach))
        .route("/request-seller", post(sellers::request))
        .route("/request-seller-status", get(sellers::status))
        .route("/seller-data", get(sellers::seller_data))
        .route("/about-me", put(sellers::about_me))
        .route(
            "/portfolios",
            get(portfolios::mine).post(portfolios::create),
        )
        .route(
            "/portfolios/{id}",
            put(portfolios::update).delete(portfolios::delete),
        )
}

/// Create the `/users` routes router (other users).
pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(users::search))
        .route("/{uid}/portfolios", get(portfolios::of_user))
}

/// Create the majors routes router.
pub fn major_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(majors::index).post(majors::create))
        .route("/{id}", get(majors::show).delete(majors::delete))
}

/// Create the categories routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
}

/// Create the services (taxonomy leaf) routes router.
pub fn offering_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(offerings::index).post(offerings::create))
        .route("/by-title", get(offerings::by_title))
        .route(
            "/{id}",
            get(offerings::show)
                .put(offerings::update)
                .delete(offerings::delete),
        )
}

/// Create the skills routes router.
pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(skills::index).post(skills::create))
        .route(
            "/{id}",
            get(skills::show).put(skills::update).delete(skills::delete),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::mine).post(products::create))
        .route("/view", get(products::view))
        .route("/search", get(products::search))
        .route("/{id}", put(products::update).delete(products::delete))
}

/// Create the conversation routes router.
pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(messages::conversations).post(messages::create_chatroom))
        .route("/{id}/messages", get(messages::index))
        .route(
            "/{id}/messages/{message_id}",
            get(messages::show)
                .put(messages::update)
                .delete(messages::delete),
        )
}

/// Create the transaction routes router.
pub fn transaction_routes() -> Router<AppState> {
    Router::new().route("/", get(transactions::index).post(transactions::create))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/login/google", post(auth::google))
        .nest("/user", user_routes())
        .nest("/users", users_routes())
        .route("/sellers", get(sellers::index))
        .route("/admin/verify-seller", post(sellers::verify))
        .nest("/majors", major_routes())
        .nest("/categories", category_routes())
        .nest("/services", offering_routes())
        .nest("/skills", skill_routes())
        .nest("/products", product_routes())
        .nest("/conversations", conversation_routes())
        .route("/messages", post(messages::send))
        .nest("/transactions", transaction_routes())
        .route("/search", get(search::search))
}
