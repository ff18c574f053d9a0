//! Taxonomy and product flows through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use skillx_core::{Collection, RecordPath, Role};
use skillx_integration_tests::{TestContext, record};

async fn product_count(ctx: &TestContext, seller: &str) -> usize {
    ctx.read(&record(Collection::Products, seller))
        .await
        .and_then(|v| v.as_object().map(serde_json::Map::len))
        .unwrap_or(0)
}

#[tokio::test]
async fn test_product_in_sellers_taxonomy_is_created_with_resolved_ids() {
    let ctx = TestContext::new();
    ctx.seed_marketplace("sally").await;

    let (status, body) = ctx
        .post(
            "/products",
            Some("sally"),
            json!({
                "nameProduct": "Company profile site",
                "description": "Five pages",
                "price": "150.000",
                "idCategory": "c-web",
                "idService": "s-landing"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["idMajor"], "m-eng");
    assert_eq!(body["data"]["major"], "Engineering");
    assert_eq!(body["data"]["idCategory"], "c-web");
    assert_eq!(body["data"]["idService"], "s-landing");
    assert_eq!(product_count(&ctx, "sally").await, 1);
}

#[tokio::test]
async fn test_service_from_another_category_is_rejected_and_nothing_stored() {
    let ctx = TestContext::new();
    ctx.seed_marketplace("sally").await;
    ctx.seed_category("c-mobile", "Mobile Apps", "m-eng").await;
    ctx.seed_service("s-android", "Android App", "c-mobile").await;

    let (status, body) = ctx
        .post(
            "/products",
            Some("sally"),
            json!({
                "nameProduct": "Landing page",
                "price": "100.000",
                "idCategory": "c-web",
                "idService": "s-android"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "Selected Service is not part of the chosen Category"
    );
    assert_eq!(product_count(&ctx, "sally").await, 0);
}

#[tokio::test]
async fn test_category_outside_sellers_major_is_rejected() {
    let ctx = TestContext::new();
    ctx.seed_marketplace("sally").await;

    let (status, body) = ctx
        .post(
            "/products",
            Some("sally"),
            json!({
                "nameProduct": "Portrait",
                "price": "50.000",
                "idCategory": "c-illu",
                "idService": "s-portrait"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Selected Category is not part of the seller's Major"
    );
    assert_eq!(product_count(&ctx, "sally").await, 0);
}

#[tokio::test]
async fn test_product_without_application_is_forbidden() {
    let ctx = TestContext::new();
    ctx.seed_marketplace("sally").await;
    ctx.seed_user("bob", Role::Buyer, false).await;

    let (status, _) = ctx
        .post(
            "/products",
            Some("bob"),
            json!({
                "nameProduct": "Site",
                "price": "1",
                "idCategory": "c-web",
                "idService": "s-landing"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_product_field_is_unprocessable() {
    let ctx = TestContext::new();
    ctx.seed_marketplace("sally").await;

    let (status, body) = ctx
        .post(
            "/products",
            Some("sally"),
            json!({ "price": "1", "idCategory": "c-web", "idService": "s-landing" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "nameProduct is required");
}

#[tokio::test]
async fn test_single_field_product_update_keeps_other_fields() {
    let ctx = TestContext::new();
    ctx.seed_marketplace("sally").await;
    let (_, created) = ctx
        .post(
            "/products",
            Some("sally"),
            json!({
                "nameProduct": "Company profile site",
                "description": "Five pages",
                "price": "150.000",
                "idCategory": "c-web",
                "idService": "s-landing"
            }),
        )
        .await;
    let id = created["data"]["uid"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .put(
            &format!("/products/{id}"),
            Some("sally"),
            json!({ "price": "175.000" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let stored = ctx
        .read(&RecordPath::nested(Collection::Products, "sally", &id).unwrap())
        .await
        .unwrap();
    assert_eq!(stored["price"], "175.000");
    assert_eq!(stored["nameProduct"], "Company profile site");
    assert_eq!(stored["description"], "Five pages");
    assert_eq!(stored["idService"], "s-landing");
}

#[tokio::test]
async fn test_category_with_unknown_major_is_rejected() {
    let ctx = TestContext::new();
    ctx.seed_user("root", Role::Admin, true).await;
    ctx.seed_major("m-eng", "Engineering").await;

    let (status, _) = ctx
        .post(
            "/categories",
            Some("root"),
            json!({
                "title": "Pottery",
                "photo_url": "https://cdn/pottery.png",
                "title_major": "Ceramics"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.get("/categories", Some("root")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_category_and_service_creation_chain() {
    let ctx = TestContext::new();
    ctx.seed_user("root", Role::Admin, true).await;
    ctx.seed_major("m-eng", "Engineering").await;

    let (status, category) = ctx
        .post(
            "/categories",
            Some("root"),
            json!({
                "title": "Data",
                "photo_url": "https://cdn/data.png",
                "title_major": "Engineering"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{category}");
    assert_eq!(category["data"]["id_major"], "m-eng");

    let (status, service) = ctx
        .post(
            "/services",
            Some("root"),
            json!({
                "title_service": "Dashboard",
                "icon_url": "https://cdn/dash.png",
                "title_category": "Data"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{service}");
    assert_eq!(service["data"]["id_category"], category["data"]["id_category"]);

    let (status, found) = ctx
        .get("/services/by-title?title=Dashboard", Some("root"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["data"]["id_service"], service["data"]["id_service"]);
}

#[tokio::test]
async fn test_taxonomy_writes_need_admin() {
    let ctx = TestContext::new();
    ctx.seed_user("bob", Role::Buyer, false).await;

    let (status, _) = ctx
        .post(
            "/majors",
            Some("bob"),
            json!({ "titleMajor": "Law", "iconUrl": "https://cdn/law.png", "link": "https://law" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_public_search_finds_products_by_name_and_owner() {
    let ctx = TestContext::new();
    ctx.seed_user("dina", Role::Seller, true).await;
    ctx.seed_user("eko", Role::Seller, true).await;
    ctx.seed_product("dina", "p1", "Logo design", "50.000").await;
    ctx.seed_product("eko", "p2", "Dina-style poster", "75.000").await;
    ctx.seed_product("eko", "p3", "Translation", "20.000").await;

    let (status, body) = ctx.get("/search?query=dina", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 1);

    let mut names: Vec<&str> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nameProduct"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Dina-style poster", "Logo design"]);
}

#[tokio::test]
async fn test_major_needs_every_field() {
    let ctx = TestContext::new();
    ctx.seed_user("root", Role::Admin, true).await;

    let (status, body) = ctx
        .post(
            "/majors",
            Some("root"),
            json!({ "titleMajor": "Law", "link": "https://law" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "iconUrl is required");

    let (status, body) = ctx
        .post(
            "/majors",
            Some("root"),
            json!({ "titleMajor": "Law", "iconUrl": "https://cdn/law.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "link is required");

    let (_, list) = ctx.get("/majors", Some("root")).await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_seller_deletes_only_own_product() {
    let ctx = TestContext::new();
    ctx.seed_user("sally", Role::Seller, true).await;
    ctx.seed_user("eko", Role::Seller, true).await;
    ctx.seed_product("sally", "p1", "Landing page", "100.000").await;

    let (status, _) = ctx.delete("/products/p1", Some("eko")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(product_count(&ctx, "sally").await, 1);

    let (status, body) = ctx.delete("/products/p1", Some("sally")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(product_count(&ctx, "sally").await, 0);

    let (status, _) = ctx.delete("/products/p1", Some("sally")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
