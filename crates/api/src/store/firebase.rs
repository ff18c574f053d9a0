//! Firebase Realtime Database REST client.
//!
//! Every path maps to `{database_url}/{path}.json`. Reads are `GET`, whole
//! replacements `PUT`, child merges `PATCH`, removals `DELETE`. Equality
//! queries use `orderBy="<child>"&equalTo=<json>`, which requires an
//! `.indexOn` rule for `<child>` in the database rules.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, error, instrument};
use url::Url;

use skillx_core::RecordPath;

use super::{RecordStore, StoreError};

/// Realtime Database client authenticated with a database secret.
#[derive(Clone)]
pub struct FirebaseStore {
    inner: Arc<FirebaseStoreInner>,
}

struct FirebaseStoreInner {
    client: Client,
    base_url: Url,
    secret: SecretString,
}

impl std::fmt::Debug for FirebaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseStore")
            .field("base_url", &self.inner.base_url.as_str())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl FirebaseStore {
    /// Create a client for the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the URL is not an absolute http(s) URL
    /// or the HTTP client cannot be built.
    pub fn new(
        database_url: &str,
        secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(database_url.trim_end_matches('/'))
            .map_err(|e| StoreError::Backend(format!("invalid database URL: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(StoreError::Backend(format!(
                "database URL must be http(s): {base_url}"
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(FirebaseStoreInner {
                client,
                base_url,
                secret,
            }),
        })
    }

    /// Build `{base}/{segments...}.json?auth=...`.
    fn endpoint(&self, path: &RecordPath) -> Result<Url, StoreError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StoreError::Backend("database URL cannot be a base".to_string()))?;
            segments.pop_if_empty();

            let mut iter = path.segments().peekable();
            while let Some(segment) = iter.next() {
                if iter.peek().is_some() {
                    segments.push(segment);
                } else {
                    segments.push(&format!("{segment}.json"));
                }
            }
        }
        url.query_pairs_mut()
            .append_pair("auth", self.inner.secret.expose_secret());
        Ok(url)
    }

    /// Send one request and return the parsed body (`null` for no data).
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, StoreError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        // The request URL carries the database secret.
        let response = request.send().await.map_err(redact)?;
        let status = response.status();
        let text = response.text().await.map_err(redact)?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Realtime Database returned non-success status"
            );
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Decode {
            path: "<response>".to_string(),
            source,
        })
    }
}

fn redact(err: reqwest::Error) -> StoreError {
    StoreError::Http(err.without_url())
}

#[async_trait]
impl RecordStore for FirebaseStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &RecordPath) -> Result<Option<Value>, StoreError> {
        let value = self.send(Method::GET, self.endpoint(path)?, None).await?;
        debug!(found = !value.is_null(), "Fetched record");
        Ok((!value.is_null()).then_some(value))
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn set(&self, path: &RecordPath, value: Value) -> Result<(), StoreError> {
        self.send(Method::PUT, self.endpoint(path)?, Some(&value))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, fields), fields(path = %path, field_count = fields.len()))]
    async fn update(
        &self,
        path: &RecordPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let body = Value::Object(fields);
        self.send(Method::PATCH, self.endpoint(path)?, Some(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete(&self, path: &RecordPath) -> Result<(), StoreError> {
        self.send(Method::DELETE, self.endpoint(path)?, None).await?;
        Ok(())
    }

    #[instrument(skip(self, value), fields(path = %path, child = %child))]
    async fn query_equal(
        &self,
        path: &RecordPath,
        child: &str,
        value: &Value,
    ) -> Result<Map<String, Value>, StoreError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("orderBy", &Value::String(child.to_owned()).to_string())
            .append_pair("equalTo", &value.to_string());

        match self.send(Method::GET, url, None).await? {
            Value::Object(matches) => Ok(matches),
            Value::Null => Ok(Map::new()),
            other => Err(StoreError::Backend(format!(
                "query at {path} returned a non-object: {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skillx_core::Collection;

    use super::*;

    fn store() -> FirebaseStore {
        FirebaseStore::new(
            "https://skillx-default-rtdb.asia-southeast1.firebasedatabase.app/",
            SecretString::from("k3Y9sEcr7"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_shape() {
        let path = RecordPath::nested(Collection::Products, "seller 1", "p1").unwrap();
        let url = store().endpoint(&path).unwrap();
        assert_eq!(
            url.as_str(),
            "https://skillx-default-rtdb.asia-southeast1.firebasedatabase.app/products/seller%201/p1.json?auth=k3Y9sEcr7"
        );
    }

    #[test]
    fn test_collection_endpoint() {
        let url = store()
            .endpoint(&RecordPath::collection(Collection::RegisterSellers))
            .unwrap();
        assert_eq!(url.path(), "/registerSellers.json");
    }

    #[tokio::test]
    async fn test_network_error_does_not_leak_secret() {
        let store = FirebaseStore::new(
            "http://127.0.0.1:1",
            SecretString::from("TOPSECRETdbKEY42"),
            Duration::from_secs(1),
        )
        .unwrap();
        let path = RecordPath::record(Collection::Users, "u1").unwrap();

        let err = store.get(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
        let rendered = crate::error::AppError::from(err).to_string();
        assert!(!rendered.contains("TOPSECRETdbKEY42"), "{rendered}");
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(
            FirebaseStore::new("ftp://db", SecretString::from("x"), Duration::from_secs(1))
                .is_err()
        );
        assert!(
            FirebaseStore::new("not a url", SecretString::from("x"), Duration::from_secs(1))
                .is_err()
        );
    }
}
