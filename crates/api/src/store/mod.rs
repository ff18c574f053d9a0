//! Hierarchical record store access.
//!
//! # Architecture
//!
//! - [`RecordStore`] is the raw JSON seam: get/set/update/delete of whole
//!   subtrees plus a child-equality query, addressed by [`RecordPath`].
//! - [`Store`] wraps a shared `RecordStore` and adds typed (de)serialization.
//!   Handlers only ever see `Store`.
//! - [`FirebaseStore`] talks to the Firebase Realtime Database REST API;
//!   [`MemoryStore`] keeps the same tree in process for local runs and tests.
//!
//! No operation spans more than one path atomically. Read-modify-write
//! sequences in handlers are last-writer-wins.

mod firebase;
mod memory;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use skillx_core::RecordPath;

/// Errors that can occur when talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A stored record did not match the expected shape.
    #[error("could not decode record at {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    /// A value could not be turned into JSON.
    #[error("could not encode record: {0}")]
    Encode(serde_json::Error),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Raw access to a JSON tree addressed by slash-delimited paths.
///
/// Writing `null` (or an empty object) removes a node, matching Firebase
/// semantics; reads of missing nodes return `None`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the subtree at `path`.
    async fn get(&self, path: &RecordPath) -> Result<Option<Value>, StoreError>;

    /// Replace the subtree at `path`.
    async fn set(&self, path: &RecordPath, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the children of `path`, leaving other children untouched.
    async fn update(&self, path: &RecordPath, fields: Map<String, Value>)
    -> Result<(), StoreError>;

    /// Remove the subtree at `path`.
    async fn delete(&self, path: &RecordPath) -> Result<(), StoreError>;

    /// Children of `path` whose `child` field equals `value`.
    async fn query_equal(
        &self,
        path: &RecordPath,
        child: &str,
        value: &Value,
    ) -> Result<Map<String, Value>, StoreError>;
}

/// Typed handle to the record store.
///
/// Cheaply cloneable; all clones share the same backend.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(backend: impl RecordStore + 'static) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }

    #[must_use]
    pub fn from_shared(backend: Arc<dyn RecordStore>) -> Self {
        Self { inner: backend }
    }

    /// Read and decode the record at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure or when the record has the wrong shape.
    pub async fn get<T: DeserializeOwned>(&self, path: &RecordPath) -> Result<Option<T>, StoreError> {
        self.inner
            .get(path)
            .await?
            .map(|value| decode(path, value))
            .transpose()
    }

    /// Whether anything is stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn exists(&self, path: &RecordPath) -> Result<bool, StoreError> {
        Ok(self.inner.get(path).await?.is_some())
    }

    /// Replace the record at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn set<T: Serialize + Sync>(&self, path: &RecordPath, record: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(record).map_err(StoreError::Encode)?;
        self.inner.set(path, value).await
    }

    /// Merge the named fields of `patch` into the record at `path`.
    ///
    /// `patch` must serialize to a JSON object; absent `Option` fields should
    /// be skipped during serialization so they leave stored values untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure or if `patch` is not an object.
    pub async fn update<T: Serialize + Sync>(&self, path: &RecordPath, patch: &T) -> Result<(), StoreError> {
        match serde_json::to_value(patch).map_err(StoreError::Encode)? {
            Value::Object(fields) if fields.is_empty() => Ok(()),
            Value::Object(fields) => self.inner.update(path, fields).await,
            other => Err(StoreError::Backend(format!(
                "update at {path} needs an object, got {other}"
            ))),
        }
    }

    /// Remove the subtree at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn delete(&self, path: &RecordPath) -> Result<(), StoreError> {
        self.inner.delete(path).await
    }

    /// Decode every direct child of `path`, keyed by child key.
    ///
    /// Children that do not decode are logged and skipped so one malformed
    /// record cannot take down a listing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn list<T: DeserializeOwned>(&self, path: &RecordPath) -> Result<Vec<(String, T)>, StoreError> {
        let Some(value) = self.inner.get(path).await? else {
            return Ok(Vec::new());
        };
        Ok(decode_children(path, value))
    }

    /// Decode every grandchild of `path` as `(parent key, child key, record)`.
    ///
    /// Used for collections partitioned by owner, e.g. `products/{seller}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn list_nested<T: DeserializeOwned>(
        &self,
        path: &RecordPath,
    ) -> Result<Vec<(String, String, T)>, StoreError> {
        let Some(Value::Object(parents)) = self.inner.get(path).await? else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for (parent, children) in parents {
            for (key, record) in decode_children::<T>(path, children) {
                out.push((parent.clone(), key, record));
            }
        }
        Ok(out)
    }

    /// Children of `path` whose `child` field equals `value`, decoded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn find_by_child<T: DeserializeOwned>(
        &self,
        path: &RecordPath,
        child: &str,
        value: &str,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let matches = self
            .inner
            .query_equal(path, child, &Value::String(value.to_owned()))
            .await?;
        Ok(decode_children(path, Value::Object(matches)))
    }
}

fn decode<T: DeserializeOwned>(path: &RecordPath, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Decode {
        path: path.to_string(),
        source,
    })
}

fn decode_children<T: DeserializeOwned>(path: &RecordPath, value: Value) -> Vec<(String, T)> {
    let Value::Object(children) = value else {
        tracing::warn!(path = %path, "Expected an object of records");
        return Vec::new();
    };

    children
        .into_iter()
        .filter_map(|(key, child)| match serde_json::from_value(child) {
            Ok(record) => Some((key, record)),
            Err(e) => {
                tracing::warn!(path = %path, key = %key, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}
