//! Checkout through the full router with a recording payment gateway.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use skillx_core::{Collection, Role};
use skillx_integration_tests::{TestContext, record};

async fn shop(price: &str) -> TestContext {
    let ctx = TestContext::new();
    ctx.seed_user("buyer", Role::Buyer, false).await;
    ctx.seed_user("sally", Role::Seller, true).await;
    ctx.seed_product("sally", "p1", "Landing page", price).await;
    ctx
}

#[tokio::test]
async fn test_total_is_unit_price_times_quantity() {
    let ctx = shop("100.000").await;

    let (status, body) = ctx
        .post(
            "/transactions",
            Some("buyer"),
            json!({ "seller_id": "sally", "product_id": "p1", "quantity": 2 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Transaction created successfully");
    assert_eq!(body["data"]["transaction"]["total_price"], "200000.00");
    assert_eq!(body["data"]["transaction"]["status"], "pending");
    assert!(
        body["data"]["url"]
            .as_str()
            .unwrap()
            .starts_with("https://pay.skillx.test/")
    );

    let requests = ctx.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].gross_amount, 200_000);
    assert_eq!(requests[0].customer_email, "buyer@skillx.test");
    assert_eq!(requests[0].items[0].price, 100_000);

    let (status, list) = ctx.get("/transactions", Some("buyer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_comma_grouping_gives_the_same_total() {
    let ctx = shop("100,000").await;
    let (status, body) = ctx
        .post(
            "/transactions",
            Some("buyer"),
            json!({ "seller_id": "sally", "product_id": "p1", "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["transaction"]["total_price"], "200000.00");
}

#[tokio::test]
async fn test_gateway_failure_persists_nothing() {
    let ctx = shop("100.000").await;
    ctx.gateway.fail_checkouts();

    let (status, body) = ctx
        .post(
            "/transactions",
            Some("buyer"),
            json!({ "seller_id": "sally", "product_id": "p1", "quantity": 1 }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(ctx.read(&record(Collection::Transactions, "buyer")).await.is_none());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = shop("100.000").await;
    let (status, _) = ctx
        .post(
            "/transactions",
            Some("buyer"),
            json!({ "seller_id": "sally", "product_id": "nope", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(ctx.gateway.requests().is_empty());
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let ctx = shop("100.000").await;
    let (status, _) = ctx
        .post(
            "/transactions",
            Some("buyer"),
            json!({ "seller_id": "sally", "product_id": "p1", "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
