//! Checkout route handlers.

use axum::extract::State;
use serde::Serialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Transaction;
use crate::routes::{ApiJson, ApiResponse, created, ok};
use crate::services::{CheckoutService, NewTransaction};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutCreated {
    pub transaction: Transaction,
    /// Hosted payment page the client redirects to.
    pub url: String,
}

/// POST /transactions
///
/// # Errors
///
/// 422 for a missing id, 400 for a bad quantity or a product without a
/// price, 404 for an unknown product, 500 when the gateway refuses.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<NewTransaction>,
) -> Result<ApiResponse<CheckoutCreated>> {
    let (transaction, session) = CheckoutService::new(state.store(), state.payments())
        .create_transaction(&caller.uid, body)
        .await?;
    Ok(created(
        "Transaction created successfully",
        CheckoutCreated {
            transaction,
            url: session.redirect_url,
        },
    ))
}

/// GET /transactions
///
/// # Errors
///
/// 500 on store failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<Vec<Transaction>>> {
    let transactions = CheckoutService::new(state.store(), state.payments())
        .transactions_for(&caller.uid)
        .await?;
    Ok(ok(transactions))
}
