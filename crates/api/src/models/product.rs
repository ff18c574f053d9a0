//! Seller product listings (`products/{seller_uid}/{product_id}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillx_core::{CategoryId, MajorId, ProductId, ServiceId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    /// Product id (the record key).
    pub uid: ProductId,
    #[serde(rename = "sellerId")]
    pub seller_id: UserId,
    #[serde(rename = "nameProduct")]
    pub name: String,
    pub description: String,
    pub photo_url: Vec<String>,
    /// Seller-entered price text, e.g. `"150.000"`.
    pub price: String,
    /// Title of the seller's major at creation time.
    pub major: String,
    #[serde(rename = "idMajor")]
    pub id_major: MajorId,
    #[serde(rename = "idCategory")]
    pub id_category: CategoryId,
    #[serde(rename = "idService")]
    pub id_service: ServiceId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
