//! Firebase Authentication client.
//!
//! ID tokens are RS256 JWTs signed by Google's `securetoken` service account.
//! Verification follows the Firebase Admin SDK rules: the `kid` header names a
//! current Google public key, `aud` is the project id, `iss` is
//! `https://securetoken.google.com/<project>` and `sub` is a non-empty uid.
//! Public keys are cached with `moka` for an hour.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use skillx_core::UserId;

use super::{IdentityError, IdentityProvider, VerifiedIdentity};
use crate::config::FirebaseAuthConfig;

/// Google's JWK endpoint for Firebase ID token signing keys.
const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Minimum time between key set fetches triggered by unknown `kid`s.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Identity Toolkit base URL.
const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com/v1";

/// Firebase Authentication client.
#[derive(Clone)]
pub struct FirebaseIdentity {
    inner: Arc<FirebaseIdentityInner>,
}

struct FirebaseIdentityInner {
    client: Client,
    project_id: String,
    web_api_key: SecretString,
    keys: Cache<String, DecodingKey>,
    last_refresh: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for FirebaseIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentity")
            .field("project_id", &self.inner.project_id)
            .field("web_api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Deserialize)]
struct ToolkitErrorBody {
    error: ToolkitError,
}

#[derive(Deserialize)]
struct ToolkitError {
    message: String,
}

impl FirebaseIdentity {
    /// Create a new Firebase Authentication client.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Http` if the HTTP client cannot be built.
    pub fn new(config: &FirebaseAuthConfig, timeout: Duration) -> Result<Self, IdentityError> {
        let keys = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Ok(Self {
            inner: Arc::new(FirebaseIdentityInner {
                client: Client::builder().timeout(timeout).build()?,
                project_id: config.project_id.clone(),
                web_api_key: config.web_api_key.clone(),
                keys,
                last_refresh: Mutex::new(None),
            }),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.inner.project_id.as_str()]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.inner.project_id
        )]);
        validation
    }

    /// Look up a signing key, refreshing the key set on a miss.
    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        if let Some(key) = self.inner.keys.get(kid).await {
            return Ok(key);
        }

        if !self.claim_refresh(Instant::now()) {
            debug!(kid, "Unknown signing key, key set refreshed recently");
            return Err(IdentityError::InvalidToken(format!(
                "unknown signing key {kid}"
            )));
        }

        self.refresh_keys().await?;
        self.inner
            .keys
            .get(kid)
            .await
            .ok_or_else(|| IdentityError::InvalidToken(format!("unknown signing key {kid}")))
    }

    /// Reserve the next key set fetch, or refuse if one happened too recently.
    fn claim_refresh(&self, now: Instant) -> bool {
        let Ok(mut last) = self.inner.last_refresh.lock() else {
            return true;
        };
        if !refresh_due(*last, now) {
            return false;
        }
        *last = Some(now);
        true
    }

    #[instrument(skip(self))]
    async fn refresh_keys(&self) -> Result<(), IdentityError> {
        let response = self.inner.client.get(GOOGLE_JWKS_URL).send().await?;
        if !response.status().is_success() {
            return Err(IdentityError::Provider(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let set: JwkSet = response.json().await?;
        for jwk in set.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => self.inner.keys.insert(jwk.kid, key).await,
                Err(e) => warn!(kid = %jwk.kid, error = %e, "Skipping unusable signing key"),
            }
        }
        debug!(count = self.inner.keys.entry_count(), "Refreshed Firebase signing keys");
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header = decode_header(token).map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing kid".to_string()))?;

        let key = self.signing_key(&kid).await?;
        let data = decode::<IdTokenClaims>(token, &key, &self.validation())
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        claims_to_identity(data.claims)
    }

    #[instrument(skip(self, password, display_name))]
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserId, IdentityError> {
        let url = Url::parse_with_params(
            &format!("{IDENTITY_TOOLKIT_BASE}/accounts:signUp"),
            &[("key", self.inner.web_api_key.expose_secret())],
        )
        .map_err(|e| IdentityError::Provider(e.to_string()))?;

        let response = self
            .inner
            .client
            .post(url)
            .json(&SignUpRequest {
                email,
                password,
                display_name,
                return_secure_token: false,
            })
            .send()
            .await
            .map_err(redact)?;

        if response.status().is_success() {
            let body: SignUpResponse = response.json().await.map_err(redact)?;
            debug!(uid = %body.local_id, "Created Firebase account");
            return Ok(UserId::new(body.local_id));
        }

        let status = response.status();
        let text = response.text().await.map_err(redact)?;
        match serde_json::from_str::<ToolkitErrorBody>(&text) {
            Ok(body) => Err(map_toolkit_error(&body.error.message)),
            Err(_) => Err(IdentityError::Provider(format!(
                "signUp returned {status}: {}",
                text.chars().take(200).collect::<String>()
            ))),
        }
    }
}

fn refresh_due(last: Option<Instant>, now: Instant) -> bool {
    last.is_none_or(|at| now.saturating_duration_since(at) >= MIN_REFRESH_INTERVAL)
}

/// Drop the request URL, which carries the web API key.
fn redact(err: reqwest::Error) -> IdentityError {
    IdentityError::Http(err.without_url())
}

fn claims_to_identity(claims: IdTokenClaims) -> Result<VerifiedIdentity, IdentityError> {
    if claims.sub.trim().is_empty() {
        return Err(IdentityError::InvalidToken("empty subject".to_string()));
    }
    Ok(VerifiedIdentity {
        uid: UserId::new(claims.sub),
        email: claims.email,
        name: claims.name,
        picture: claims.picture,
    })
}

/// Map an Identity Toolkit error code (e.g. `WEAK_PASSWORD : ...`) to an error.
fn map_toolkit_error(message: &str) -> IdentityError {
    let code = message.split_once(" : ").map_or(message, |(code, _)| code).trim();
    match code {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "INVALID_EMAIL" => IdentityError::Rejected("Invalid email address".to_string()),
        "WEAK_PASSWORD" => {
            IdentityError::Rejected("Password should be at least 6 characters".to_string())
        }
        "OPERATION_NOT_ALLOWED" => {
            IdentityError::Provider("email/password sign-in is disabled".to_string())
        }
        other => IdentityError::Provider(other.to_string()),
    }
}
