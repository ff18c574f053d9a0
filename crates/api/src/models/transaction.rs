//! Checkout transactions (`transactions/{buyer_uid}/{id}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillx_core::{ProductId, TransactionId, TransactionStatus, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    pub id_transaction: TransactionId,
    /// Buyer.
    pub user_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    /// Unit price, two decimals.
    pub price: String,
    /// Unit price times quantity, two decimals.
    pub total_price: String,
    pub quantity: u32,
    pub status: TransactionStatus,
    pub payment_type: String,
    pub transaction_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_time: Option<DateTime<Utc>>,
    pub order_id: String,
    pub payment_token: String,
    pub payment_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
