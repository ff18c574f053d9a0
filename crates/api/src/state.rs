//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{ApiConfig, StoreConfig};
use crate::identity::{FirebaseIdentity, IdentityError, IdentityProvider};
use crate::payments::{MidtransSnap, PaymentError, PaymentGateway};
use crate::store::{FirebaseStore, MemoryStore, Store, StoreError};

/// Error building the external clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("record store: {0}")]
    Store(#[from] StoreError),
    #[error("identity provider: {0}")]
    Identity(#[from] IdentityError),
    #[error("payment gateway: {0}")]
    Payment(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything inside is built
/// once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Store,
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        store: Store,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                identity,
                payments,
            }),
        }
    }

    /// Build the production clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if any HTTP client cannot be constructed or the
    /// database URL is invalid.
    pub fn from_config(config: ApiConfig) -> Result<Self, StateError> {
        let store = match &config.store {
            StoreConfig::Firebase {
                database_url,
                database_secret,
            } => Store::new(FirebaseStore::new(
                database_url,
                database_secret.clone(),
                config.http_timeout,
            )?),
            StoreConfig::Memory => {
                tracing::warn!("Using the in-memory record store; data is lost on restart");
                Store::new(MemoryStore::new())
            }
        };
        let identity = FirebaseIdentity::new(&config.firebase, config.http_timeout)?;
        let payments = MidtransSnap::new(&config.midtrans, config.http_timeout)?;

        Ok(Self::new(config, store, Arc::new(identity), Arc::new(payments)))
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the record store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }
}
