//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_PROJECT_ID` - Firebase project (ID token audience)
//! - `FIREBASE_WEB_API_KEY` - Web API key for the Identity Toolkit
//! - `MIDTRANS_SERVER_KEY` - Midtrans server key (high entropy)
//! - `MIDTRANS_CLIENT_KEY` - Midtrans client key
//! - `FIREBASE_DATABASE_URL` - Realtime Database URL (when `SKILLX_STORE=firebase`)
//! - `FIREBASE_DATABASE_SECRET` - Realtime Database secret (when `SKILLX_STORE=firebase`)
//!
//! ## Optional
//! - `SKILLX_HOST` - Bind address (default: 0.0.0.0)
//! - `SKILLX_PORT` - Listen port (falls back to `PORT`, default: 8080)
//! - `SKILLX_CORS_ORIGIN` - Allowed browser origin (default: <http://localhost:8100>)
//! - `SKILLX_STORE` - `firebase` (default) or `memory`
//! - `SKILLX_HTTP_TIMEOUT_SECS` - Outbound request timeout (default: 15)
//! - `MIDTRANS_ENVIRONMENT` - `sandbox` (default) or `production`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origin allowed by the CORS layer
    pub cors_origin: String,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Record store backend
    pub store: StoreConfig,
    /// Firebase Authentication settings
    pub firebase: FirebaseAuthConfig,
    /// Midtrans Snap settings
    pub midtrans: MidtransConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Which record store backend to run against.
#[derive(Clone)]
pub enum StoreConfig {
    /// Firebase Realtime Database over REST.
    Firebase {
        database_url: String,
        database_secret: SecretString,
    },
    /// In-process tree; data is lost on restart.
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Firebase { database_url, .. } => f
                .debug_struct("Firebase")
                .field("database_url", database_url)
                .field("database_secret", &"[REDACTED]")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Firebase Authentication configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseAuthConfig {
    /// Firebase project ID; ID tokens must name it as audience.
    pub project_id: String,
    /// Web API key used for Identity Toolkit account creation.
    pub web_api_key: SecretString,
}

impl std::fmt::Debug for FirebaseAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuthConfig")
            .field("project_id", &self.project_id)
            .field("web_api_key", &"[REDACTED]")
            .finish()
    }
}

/// Midtrans environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidtransEnvironment {
    Sandbox,
    Production,
}

impl MidtransEnvironment {
    /// Base URL of the Snap API for this environment.
    #[must_use]
    pub const fn snap_base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://app.sandbox.midtrans.com/snap/v1",
            Self::Production => "https://app.midtrans.com/snap/v1",
        }
    }
}

impl std::str::FromStr for MidtransEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("expected sandbox or production, got {other}")),
        }
    }
}

/// Midtrans payment gateway configuration.
#[derive(Clone)]
pub struct MidtransConfig {
    pub server_key: SecretString,
    pub client_key: String,
    pub environment: MidtransEnvironment,
}

impl std::fmt::Debug for MidtransConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidtransConfig")
            .field("server_key", &"[REDACTED]")
            .field("client_key", &self.client_key)
            .field("environment", &self.environment)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("SKILLX_HOST", &get_env_or_default("SKILLX_HOST", "0.0.0.0"))?;
        let port_raw = get_optional_env("SKILLX_PORT")
            .or_else(|| get_optional_env("PORT"))
            .unwrap_or_else(|| "8080".to_string());
        let port = parse_env("SKILLX_PORT", &port_raw)?;
        let timeout_secs: u64 = parse_env(
            "SKILLX_HTTP_TIMEOUT_SECS",
            &get_env_or_default("SKILLX_HTTP_TIMEOUT_SECS", "15"),
        )?;

        Ok(Self {
            host,
            port,
            cors_origin: get_env_or_default("SKILLX_CORS_ORIGIN", "http://localhost:8100"),
            http_timeout: Duration::from_secs(timeout_secs),
            store: StoreConfig::from_env()?,
            firebase: FirebaseAuthConfig::from_env()?,
            midtrans: MidtransConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("SKILLX_STORE", "firebase").as_str() {
            "memory" => Ok(Self::Memory),
            "firebase" => Ok(Self::Firebase {
                database_url: get_required_env("FIREBASE_DATABASE_URL")?,
                database_secret: get_validated_secret("FIREBASE_DATABASE_SECRET")?,
            }),
            other => Err(ConfigError::InvalidEnvVar(
                "SKILLX_STORE".to_string(),
                format!("expected firebase or memory, got {other}"),
            )),
        }
    }
}

impl FirebaseAuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            web_api_key: SecretString::from(get_required_env("FIREBASE_WEB_API_KEY")?),
        })
    }
}

impl MidtransConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_key: get_validated_secret("MIDTRANS_SERVER_KEY")?,
            client_key: get_required_env("MIDTRANS_CLIENT_KEY")?,
            environment: parse_env(
                "MIDTRANS_ENVIRONMENT",
                &get_env_or_default("MIDTRANS_ENVIRONMENT", "sandbox"),
            )?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required, non-empty environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_midtrans_sandbox_key_passes() {
        let result = validate_secret_strength("SB-Mid-server-Qw8rT2yUi9oPz4Xc", "MIDTRANS_SERVER_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_placeholder_rejected() {
        let err = validate_secret_strength("your-server-key", "MIDTRANS_SERVER_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_rejected() {
        let err = validate_secret_strength("abababababababab", "FIREBASE_DATABASE_SECRET")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_midtrans_environment_parse() {
        assert_eq!(
            "Sandbox".parse::<MidtransEnvironment>().unwrap(),
            MidtransEnvironment::Sandbox
        );
        assert!("staging".parse::<MidtransEnvironment>().is_err());
        assert!(
            MidtransEnvironment::Production
                .snap_base_url()
                .starts_with("https://app.midtrans.com")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let midtrans = MidtransConfig {
            server_key: SecretString::from("SB-Mid-server-Qw8rT2yUi9oPz4Xc"),
            client_key: "SB-Mid-client-abc".to_string(),
            environment: MidtransEnvironment::Sandbox,
        };
        let rendered = format!("{midtrans:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("Qw8rT2"));
    }
}
