//! Hosted checkout sessions.
//!
//! [`PaymentGateway`] creates a payment page for one order and hands back the
//! token and redirect URL the client opens. [`MidtransSnap`] is the production
//! implementation.

mod midtrans;

pub use midtrans::MidtransSnap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when creating a checkout session.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("gateway returned HTTP {status}: {}", .messages.join("; "))]
    Rejected { status: u16, messages: Vec<String> },

    /// The gateway answered with something unexpected.
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// One purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub id: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    pub quantity: u32,
    pub name: String,
}

/// Everything the gateway needs to open a payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_id: String,
    /// Total in the smallest currency unit.
    pub gross_amount: i64,
    pub customer_email: String,
    pub items: Vec<LineItem>,
}

/// A created payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub token: String,
    pub redirect_url: String,
}

/// Creates hosted checkout sessions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;
}
