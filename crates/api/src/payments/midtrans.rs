//! Midtrans Snap client.
//!
//! `POST {snap}/transactions` with HTTP basic auth (server key as user, empty
//! password). A successful call answers 201 with `token` and `redirect_url`;
//! failures carry an `error_messages` array.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{CheckoutRequest, CheckoutSession, LineItem, PaymentError, PaymentGateway};
use crate::config::MidtransConfig;

/// Snap rejects item names longer than this.
const MAX_ITEM_NAME_CHARS: usize = 50;

/// Midtrans Snap API client.
#[derive(Clone)]
pub struct MidtransSnap {
    inner: Arc<MidtransSnapInner>,
}

struct MidtransSnapInner {
    client: Client,
    endpoint: String,
    server_key: SecretString,
}

impl std::fmt::Debug for MidtransSnap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidtransSnap")
            .field("endpoint", &self.inner.endpoint)
            .field("server_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: CustomerDetails<'a>,
    item_details: Vec<ItemDetails<'a>>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ItemDetails<'a> {
    id: &'a str,
    price: i64,
    quantity: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SnapErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
}

impl MidtransSnap {
    /// Create a new Snap client for the configured environment.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &MidtransConfig, timeout: Duration) -> Result<Self, PaymentError> {
        Ok(Self {
            inner: Arc::new(MidtransSnapInner {
                client: Client::builder().timeout(timeout).build()?,
                endpoint: format!("{}/transactions", config.environment.snap_base_url()),
                server_key: config.server_key.clone(),
            }),
        })
    }
}

fn snap_request(request: &CheckoutRequest) -> SnapRequest<'_> {
    SnapRequest {
        transaction_details: TransactionDetails {
            order_id: &request.order_id,
            gross_amount: request.gross_amount,
        },
        customer_details: CustomerDetails {
            email: &request.customer_email,
        },
        item_details: request.items.iter().map(item_details).collect(),
    }
}

fn item_details(item: &LineItem) -> ItemDetails<'_> {
    ItemDetails {
        id: &item.id,
        price: item.price,
        quantity: item.quantity,
        name: item.name.chars().take(MAX_ITEM_NAME_CHARS).collect(),
    }
}

#[async_trait]
impl PaymentGateway for MidtransSnap {
    #[instrument(skip(self, request), fields(order_id = %request.order_id, gross_amount = request.gross_amount))]
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .basic_auth(self.inner.server_key.expose_secret(), Some(""))
            .header("Accept", "application/json")
            .json(&snap_request(request))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let messages = serde_json::from_str::<SnapErrorBody>(&text)
                .map(|body| body.error_messages)
                .unwrap_or_default();
            error!(
                status = %status,
                messages = ?messages,
                "Midtrans Snap rejected checkout"
            );
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                messages,
            });
        }

        let session: CheckoutSession = serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse Snap response"
            );
            PaymentError::Gateway(format!("unparsable Snap response: {e}"))
        })?;

        debug!("Snap checkout created");
        Ok(session)
    }
}
