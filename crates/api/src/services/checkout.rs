//! Checkout: price a product, open a payment page, record the transaction.
//!
//! The transaction is written only after the gateway has returned a session,
//! so a gateway failure leaves nothing behind. The reverse gap remains: if the
//! store write fails, the gateway holds a session with no local record.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use skillx_core::{
    Collection, Price, PriceError, ProductId, RecordPath, TransactionId, TransactionStatus,
    UserId,
};

use crate::models::{Product, Transaction, User};
use crate::payments::{CheckoutRequest, CheckoutSession, LineItem, PaymentError, PaymentGateway};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Buyer profile not found")]
    BuyerNotFound,

    #[error("Product price is missing")]
    PriceMissing,

    #[error("Invalid product price: {0}")]
    Price(PriceError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PriceError> for CheckoutError {
    fn from(err: PriceError) -> Self {
        match err {
            PriceError::Missing => Self::PriceMissing,
            other => Self::Price(other),
        }
    }
}

/// Body of a checkout request. The buyer is always the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewTransaction {
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
}

pub struct CheckoutService<'a> {
    store: &'a Store,
    gateway: &'a dyn PaymentGateway,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store, gateway: &'a dyn PaymentGateway) -> Self {
        Self { store, gateway }
    }

    /// Open a payment session for `buyer` and persist the pending transaction.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` for invalid input, a missing product or buyer,
    /// an unreadable price, a gateway failure or a store failure.
    #[instrument(skip(self, input), fields(buyer = %buyer, product = %input.product_id))]
    pub async fn create_transaction(
        &self,
        buyer: &UserId,
        input: NewTransaction,
    ) -> Result<(Transaction, CheckoutSession), CheckoutError> {
        if input.seller_id.is_blank() {
            return Err(CheckoutError::MissingField("seller_id"));
        }
        if input.product_id.is_blank() {
            return Err(CheckoutError::MissingField("product_id"));
        }
        let quantity = u32::try_from(input.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(CheckoutError::InvalidQuantity)?;

        let Ok(product_path) =
            RecordPath::nested(Collection::Products, &input.seller_id, &input.product_id)
        else {
            return Err(CheckoutError::ProductNotFound);
        };
        let product: Product = self
            .store
            .get(&product_path)
            .await?
            .ok_or(CheckoutError::ProductNotFound)?;

        let buyer_path =
            RecordPath::record(Collection::Users, buyer).map_err(|_| CheckoutError::BuyerNotFound)?;
        let buyer_record: User = self
            .store
            .get(&buyer_path)
            .await?
            .ok_or(CheckoutError::BuyerNotFound)?;

        let unit = Price::parse_listing(&product.price).inspect_err(|e| {
            warn!(raw = %product.price, error = %e, "Unreadable product price");
        })?;
        let total = unit.total(quantity)?;

        let transaction_id = TransactionId::generate();
        let request = CheckoutRequest {
            order_id: transaction_id.to_string(),
            gross_amount: total.minor_units()?,
            customer_email: buyer_record.email,
            items: vec![LineItem {
                id: input.product_id.to_string(),
                price: unit.minor_units()?,
                quantity,
                name: product.name,
            }],
        };
        let session = self.gateway.create_checkout(&request).await?;

        let now = Utc::now();
        let transaction = Transaction {
            id_transaction: transaction_id,
            user_id: buyer.clone(),
            seller_id: input.seller_id,
            product_id: input.product_id,
            price: unit.to_fixed(),
            total_price: total.to_fixed(),
            quantity,
            status: TransactionStatus::Pending,
            payment_type: String::new(),
            transaction_time: now,
            settlement_time: None,
            order_id: request.order_id,
            payment_token: session.token.clone(),
            payment_url: session.redirect_url.clone(),
            created_at: now,
            updated_at: now,
        };
        let path = RecordPath::nested(Collection::Transactions, buyer, &transaction.id_transaction)
            .map_err(|_| CheckoutError::BuyerNotFound)?;
        self.store.set(&path, &transaction).await?;

        info!(
            transaction_id = %transaction.id_transaction,
            total = %transaction.total_price,
            "Created transaction"
        );
        Ok((transaction, session))
    }

    /// The buyer's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Store` on store failure.
    pub async fn transactions_for(&self, buyer: &UserId) -> Result<Vec<Transaction>, CheckoutError> {
        let Ok(path) = RecordPath::record(Collection::Transactions, buyer) else {
            return Ok(Vec::new());
        };
        let mut transactions: Vec<Transaction> = self
            .store
            .list::<Transaction>(&path)
            .await?
            .into_iter()
            .map(|(_, transaction)| transaction)
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transactions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct RecordingGateway {
        fail: bool,
        seen: Mutex<Vec<CheckoutRequest>>,
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn create_checkout(
            &self,
            request: &CheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(PaymentError::Gateway("sandbox down".to_string()));
            }
            Ok(CheckoutSession {
                token: "snap-token".to_string(),
                redirect_url: format!("https://pay.example/{}", request.order_id),
            })
        }
    }

    async fn seeded(price: &str) -> Store {
        let store = Store::new(MemoryStore::new());
        store
            .set(
                &RecordPath::record(Collection::Users, "buyer").unwrap(),
                &User {
                    uid: "buyer".into(),
                    email: "buyer@kampus.ac.id".to_string(),
                    ..User::default()
                },
            )
            .await
            .unwrap();
        store
            .set(
                &RecordPath::nested(Collection::Products, "seller", "p1").unwrap(),
                &Product {
                    uid: "p1".into(),
                    name: "Logo design".to_string(),
                    price: price.to_string(),
                    ..Product::default()
                },
            )
            .await
            .unwrap();
        store
    }

    fn order(quantity: i64) -> NewTransaction {
        NewTransaction {
            seller_id: "seller".into(),
            product_id: "p1".into(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_total_and_persisted_record() {
        let store = seeded("100.000").await;
        let gateway = RecordingGateway::default();
        let checkout = CheckoutService::new(&store, &gateway);

        let (transaction, session) = checkout
            .create_transaction(&"buyer".into(), order(2))
            .await
            .unwrap();

        assert_eq!(transaction.price, "100000.00");
        assert_eq!(transaction.total_price, "200000.00");
        assert_eq!(transaction.status, TransactionStatus::Pending);
        assert_eq!(transaction.payment_url, session.redirect_url);

        let seen = gateway.seen.lock().unwrap();
        let request = seen.first().unwrap();
        assert_eq!(request.gross_amount, 200_000);
        assert_eq!(request.customer_email, "buyer@kampus.ac.id");
        assert_eq!(request.order_id, transaction.id_transaction.as_str());
        drop(seen);

        assert_eq!(checkout.transactions_for(&"buyer".into()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_persists_nothing() {
        let store = seeded("100,000").await;
        let gateway = RecordingGateway {
            fail: true,
            ..RecordingGateway::default()
        };
        let checkout = CheckoutService::new(&store, &gateway);

        let err = checkout
            .create_transaction(&"buyer".into(), order(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Payment(_)));
        assert!(checkout.transactions_for(&"buyer".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_price_never_reaches_gateway() {
        let store = seeded("seratus ribu").await;
        let gateway = RecordingGateway::default();
        let err = CheckoutService::new(&store, &gateway)
            .create_transaction(&"buyer".into(), order(1))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Price(PriceError::Malformed(_))));
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_input_validation() {
        let store = seeded("10.000").await;
        let gateway = RecordingGateway::default();
        let checkout = CheckoutService::new(&store, &gateway);

        assert!(matches!(
            checkout.create_transaction(&"buyer".into(), order(0)).await,
            Err(CheckoutError::InvalidQuantity)
        ));
        assert!(matches!(
            checkout
                .create_transaction(
                    &"buyer".into(),
                    NewTransaction {
                        product_id: "missing".into(),
                        ..order(1)
                    }
                )
                .await,
            Err(CheckoutError::ProductNotFound)
        ));
    }
}
