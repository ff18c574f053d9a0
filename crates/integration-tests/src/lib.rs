//! Integration test harness for the SkillX API.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`.
//! The record store is the in-memory backend; identity and payments are
//! deterministic doubles:
//!
//! - [`FakeIdentity`] accepts any non-empty bearer token and treats it as the
//!   caller's uid, so `Bearer alice` authenticates as `alice`.
//! - [`FakeGateway`] records every checkout request and can be told to fail.
//!
//! ```rust,ignore
//! let ctx = TestContext::new();
//! ctx.seed_user("alice", Role::Buyer, false).await;
//! let (status, body) = ctx.get("/user?uid=alice", Some("alice")).await;
//! assert_eq!(status, StatusCode::OK);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use skillx_api::config::{
    ApiConfig, FirebaseAuthConfig, MidtransConfig, MidtransEnvironment, StoreConfig,
};
use skillx_api::identity::{IdentityError, IdentityProvider, VerifiedIdentity};
use skillx_api::models::{Category, Major, Product, RegisterSeller, Service, Skill, User};
use skillx_api::payments::{CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway};
use skillx_api::state::AppState;
use skillx_api::store::{MemoryStore, Store};
use skillx_core::{
    CategoryId, Collection, MajorId, RecordPath, Role, SellerStatus, ServiceId, SkillId, UserId,
};

// =============================================================================
// Doubles
// =============================================================================

/// Identity provider that trusts the token as the uid.
///
/// `invalid` fails verification and `unavailable` behaves like an outage of
/// the provider's key endpoint.
#[derive(Debug, Default)]
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if token == "invalid" {
            return Err(IdentityError::InvalidToken("rejected by test double".to_string()));
        }
        if token == "unavailable" {
            return Err(IdentityError::Provider("key endpoint returned 503".to_string()));
        }
        Ok(VerifiedIdentity {
            uid: UserId::new(token),
            email: Some(format!("{token}@skillx.test")),
            name: Some(token.to_string()),
            picture: None,
        })
    }

    async fn create_account(
        &self,
        _email: &str,
        _password: &str,
        _display_name: &str,
    ) -> Result<UserId, IdentityError> {
        Ok(UserId::generate())
    }
}

/// Payment gateway that records requests.
#[derive(Debug, Default)]
pub struct FakeGateway {
    fail: AtomicBool,
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl FakeGateway {
    /// Make every following checkout fail.
    pub fn fail_checkouts(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Gateway("test gateway is down".to_string()));
        }
        Ok(CheckoutSession {
            token: format!("tok-{}", request.order_id),
            redirect_url: format!("https://pay.skillx.test/{}", request.order_id),
        })
    }
}

// =============================================================================
// Context
// =============================================================================

/// Configuration that never touches the network.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        cors_origin: "http://localhost:8100".to_string(),
        http_timeout: Duration::from_secs(1),
        store: StoreConfig::Memory,
        firebase: FirebaseAuthConfig {
            project_id: "skillx-test".to_string(),
            web_api_key: SecretString::from("test-web-api-key".to_string()),
        },
        midtrans: MidtransConfig {
            server_key: SecretString::from("test-server-key".to_string()),
            client_key: "test-client-key".to_string(),
            environment: MidtransEnvironment::Sandbox,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// One isolated application instance.
pub struct TestContext {
    pub state: AppState,
    pub store: Store,
    pub gateway: Arc<FakeGateway>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let store = Store::new(MemoryStore::new());
        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::new(
            test_config(),
            store.clone(),
            Arc::new(FakeIdentity),
            gateway.clone(),
        );
        Self {
            state,
            store,
            gateway,
        }
    }

    /// Send one request through the full router and decode the JSON body.
    ///
    /// A non-JSON body decodes as `Value::String`.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = skillx_api::app(self.state.clone())
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    async fn put_record<T: serde::Serialize + Sync>(&self, path: RecordPath, record: &T) {
        self.store.set(&path, record).await.expect("seed write");
    }

    /// Read a record back, or `None` when absent.
    pub async fn read(&self, path: &RecordPath) -> Option<Value> {
        self.store.get(path).await.expect("store read")
    }

    pub async fn seed_user(&self, uid: &str, role: Role, verified: bool) {
        let user = User {
            uid: UserId::new(uid),
            name: uid.to_string(),
            email: format!("{uid}@skillx.test"),
            role,
            verified,
            ..User::default()
        };
        self.put_record(record(Collection::Users, uid), &user).await;
    }

    pub async fn seed_major(&self, id: &str, title: &str) {
        let major = Major {
            id: MajorId::new(id),
            title: title.to_string(),
            ..Major::default()
        };
        self.put_record(record(Collection::Majors, id), &major).await;
    }

    pub async fn seed_category(&self, id: &str, title: &str, major_id: &str) {
        let category = Category {
            id: CategoryId::new(id),
            title: title.to_string(),
            id_major: MajorId::new(major_id),
            ..Category::default()
        };
        self.put_record(record(Collection::Categories, id), &category)
            .await;
    }

    pub async fn seed_service(&self, id: &str, title: &str, category_id: &str) {
        let service = Service {
            id: ServiceId::new(id),
            title_service: title.to_string(),
            id_category: CategoryId::new(category_id),
            ..Service::default()
        };
        self.put_record(record(Collection::Services, id), &service)
            .await;
    }

    pub async fn seed_skill(&self, id: &str, title: &str) {
        let skill = Skill {
            id: SkillId::new(id),
            title_skill: title.to_string(),
        };
        self.put_record(record(Collection::Skills, id), &skill).await;
    }

    /// Write raw JSON at `collection/key`, bypassing the typed models.
    pub async fn seed_raw(&self, collection: Collection, key: &str, value: Value) {
        self.put_record(record(collection, key), &value).await;
    }

    /// A pending seller application naming `major`.
    pub async fn seed_application(&self, uid: &str, major: &str) {
        let application = RegisterSeller {
            uid: UserId::new(uid),
            name: uid.to_string(),
            major: major.to_string(),
            status: SellerStatus::Pending,
            ..RegisterSeller::default()
        };
        self.put_record(record(Collection::RegisterSellers, uid), &application)
            .await;
    }

    pub async fn seed_product(&self, seller: &str, id: &str, name: &str, price: &str) {
        let product = Product {
            name: name.to_string(),
            price: price.to_string(),
            seller_id: UserId::new(seller),
            ..Product::default()
        };
        let path = RecordPath::nested(Collection::Products, seller, id).expect("legal key");
        self.put_record(path, &product).await;
    }

    /// Engineering → Web Development → Landing Page, plus Fine Arts →
    /// Illustration → Portrait, with `seller` applied under Engineering.
    pub async fn seed_marketplace(&self, seller: &str) {
        self.seed_user(seller, Role::Seller, true).await;
        self.seed_major("m-eng", "Engineering").await;
        self.seed_major("m-art", "Fine Arts").await;
        self.seed_category("c-web", "Web Development", "m-eng").await;
        self.seed_category("c-illu", "Illustration", "m-art").await;
        self.seed_service("s-landing", "Landing Page", "c-web").await;
        self.seed_service("s-portrait", "Portrait", "c-illu").await;
        self.seed_application(seller, "Engineering").await;
    }
}

/// `collection/key`, panicking on an illegal key.
#[must_use]
pub fn record(collection: Collection, key: &str) -> RecordPath {
    RecordPath::record(collection, key).expect("legal key")
}
