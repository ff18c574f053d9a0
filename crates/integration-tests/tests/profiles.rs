//! Portfolios and skills through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use skillx_core::{Collection, RecordPath, Role};
use skillx_integration_tests::TestContext;

// =============================================================================
// Portfolios
// =============================================================================

async fn with_portfolio() -> (TestContext, String) {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::Seller, true).await;
    ctx.seed_user("mallory", Role::Buyer, false).await;

    let (status, body) = ctx
        .post(
            "/user/portfolios",
            Some("alice"),
            json!({ "title": "Campus app", "description": "Flutter", "type": "project" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    (ctx, id)
}

#[tokio::test]
async fn test_portfolio_is_listed_for_owner_and_visitors() {
    let (ctx, id) = with_portfolio().await;

    let (status, mine) = ctx.get("/user/portfolios", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
    assert_eq!(mine["data"][0]["id"], id.as_str());

    let (status, theirs) = ctx.get("/users/alice/portfolios", Some("mallory")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(theirs["data"][0]["title"], "Campus app");
    assert_eq!(theirs["data"][0]["type"], "project");
}

#[tokio::test]
async fn test_portfolio_without_title_is_unprocessable() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::Buyer, false).await;

    let (status, body) = ctx
        .post("/user/portfolios", Some("alice"), json!({ "description": "x" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "title is required");
}

#[tokio::test]
async fn test_other_users_portfolio_cannot_be_changed() {
    let (ctx, id) = with_portfolio().await;
    let uri = format!("/user/portfolios/{id}");

    let (status, _) = ctx
        .put(&uri, Some("mallory"), json!({ "title": "Mine now" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&uri, Some("mallory")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let path = RecordPath::nested(Collection::Portfolios, "alice", &id).unwrap();
    let stored = ctx.read(&path).await.unwrap();
    assert_eq!(stored["title"], "Campus app");
    let foreign = RecordPath::record(Collection::Portfolios, "mallory").unwrap();
    assert!(ctx.read(&foreign).await.is_none());
}

#[tokio::test]
async fn test_owner_updates_and_deletes_portfolio() {
    let (ctx, id) = with_portfolio().await;
    let uri = format!("/user/portfolios/{id}");

    let (status, body) = ctx
        .put(&uri, Some("alice"), json!({ "status": "ongoing" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "ongoing");
    assert_eq!(body["data"]["description"], "Flutter");

    let (status, _) = ctx.delete(&uri, Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, mine) = ctx.get("/user/portfolios", Some("alice")).await;
    assert_eq!(mine["data"], json!([]));
}

// =============================================================================
// Skills
// =============================================================================

#[tokio::test]
async fn test_attach_skill_and_list_mine() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::Buyer, false).await;
    ctx.seed_skill("sk-figma", "Figma").await;

    let (status, body) = ctx
        .post(
            "/user/skills",
            Some("alice"),
            json!({ "id_skill": "sk-figma", "level": "intermediate" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["title_skill"], "Figma");

    let (status, mine) = ctx.get("/user/skills", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let skills = mine["data"].as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["id_skill"], "sk-figma");
    assert_eq!(skills[0]["level"], "intermediate");
}

#[tokio::test]
async fn test_attach_unknown_skill_is_not_found() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::Buyer, false).await;

    let (status, _) = ctx
        .post("/user/skills", Some("alice"), json!({ "id_skill": "sk-ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.post("/user/skills", Some("alice"), json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, mine) = ctx.get("/user/skills", Some("alice")).await;
    assert_eq!(mine["data"], json!([]));
}

#[tokio::test]
async fn test_skill_catalogue_writes_need_admin() {
    let ctx = TestContext::new();
    ctx.seed_user("root", Role::Admin, true).await;
    ctx.seed_user("bob", Role::Buyer, false).await;

    let (status, _) = ctx
        .post("/skills", Some("bob"), json!({ "title_skill": "Rust" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = ctx
        .post("/skills", Some("root"), json!({ "title_skill": "Rust" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let id = created["data"]["id_skill"].as_str().unwrap().to_string();

    let (status, _) = ctx.delete(&format!("/skills/{id}"), Some("bob")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, list) = ctx.get("/skills", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"][0]["title_skill"], "Rust");

    let (status, _) = ctx.delete(&format!("/skills/{id}"), Some("root")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = ctx.get("/skills", None).await;
    assert_eq!(list["data"], json!([]));
}
