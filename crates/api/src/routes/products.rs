//! Product route handlers.
//!
//! Products live under `products/{seller_uid}/{product_id}`, so every write is
//! scoped to the caller's own subtree.

use std::collections::HashSet;

use axum::extract::{Path, State};
use serde::Deserialize;

use skillx_core::{Collection, ProductId, RecordPath, UserId};

use crate::error::{AppError, Result, require};
use crate::middleware::RequireAuth;
use crate::models::{Product, RegisterSeller};
use crate::routes::users::find_users_by_name;
use crate::routes::{ApiJson, ApiQuery, ApiResponse, created, done, ok, ok_with_message};
use crate::services::{CatalogService, NewProduct, ProductPatch};
use crate::state::AppState;
use crate::store::Store;

fn with_ids(seller: &str, key: String, mut product: Product) -> Product {
    product.uid = ProductId::new(key);
    product.seller_id = UserId::new(seller);
    product
}

/// GET /products
///
/// # Errors
///
/// 500 on store failure.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<Vec<Product>>> {
    let path = RecordPath::record(Collection::Products, &caller.uid)?;
    let rows: Vec<(String, Product)> = state.store().list(&path).await?;
    Ok(ok(rows
        .into_iter()
        .map(|(key, product)| with_ids(caller.uid.as_str(), key, product))
        .collect()))
}

/// POST /products
///
/// # Errors
///
/// 422 for a missing field, 403 without a seller major, 404 for an unknown
/// category or service, 400 when the taxonomy chain does not line up.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<NewProduct>,
) -> Result<ApiResponse<Product>> {
    let product = CatalogService::new(state.store())
        .create_product(&caller.uid, body)
        .await?;
    Ok(created("Product created successfully", product))
}

/// PUT /products/{id}
///
/// # Errors
///
/// 404 when the caller has no such product; taxonomy errors as for create.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<ApiResponse<Product>> {
    let product = CatalogService::new(state.store())
        .update_product(&caller.uid, &id, patch)
        .await?;
    Ok(ok_with_message("Product updated successfully", product))
}

/// DELETE /products/{id}
///
/// # Errors
///
/// 404 when the caller has no such product.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<ApiResponse<()>> {
    let path = RecordPath::nested(Collection::Products, &caller.uid, &id)?;
    if !state.store().exists(&path).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    state.store().delete(&path).await?;

    tracing::info!(seller = %caller.uid, product_id = %id, "Product deleted");
    Ok(done("Product deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(alias = "name")]
    pub seller: Option<String>,
    #[serde(alias = "product_name")]
    pub product: Option<String>,
}

/// GET /products/view?seller=&product=
///
/// Both names match ignoring case; the seller name is the one on the seller
/// application.
///
/// # Errors
///
/// 422 without either name, 404 when the seller or product is unknown.
pub async fn view(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    ApiQuery(query): ApiQuery<ViewQuery>,
) -> Result<ApiResponse<Product>> {
    require("seller", query.seller.as_deref())?;
    require("product", query.product.as_deref())?;
    let seller_name = query.seller.unwrap_or_default();
    let product_name = query.product.unwrap_or_default();

    let sellers: Vec<(String, RegisterSeller)> = state
        .store()
        .list(&RecordPath::collection(Collection::RegisterSellers))
        .await?;
    let seller = sellers
        .into_iter()
        .find(|(_, s)| s.name.trim().eq_ignore_ascii_case(seller_name.trim()))
        .map(|(key, _)| key)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let path = RecordPath::record(Collection::Products, &seller)?;
    let rows: Vec<(String, Product)> = state.store().list(&path).await?;
    let product = rows
        .into_iter()
        .find(|(_, p)| p.name.trim().eq_ignore_ascii_case(product_name.trim()))
        .map(|(key, p)| with_ids(&seller, key, p))
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(ok(product))
}

/// Products whose name contains `needle` (ignoring case) or whose seller is in
/// `owners`. Each product appears once.
pub(crate) async fn find_products(
    store: &Store,
    needle: &str,
    owners: &HashSet<UserId>,
) -> Result<Vec<Product>> {
    let needle = needle.trim().to_lowercase();
    let rows: Vec<(String, String, Product)> = store
        .list_nested(&RecordPath::collection(Collection::Products))
        .await?;

    // One pass over the tree, so a product matching both ways is kept once.
    Ok(rows
        .into_iter()
        .filter(|(seller, _, product)| {
            owners.contains(&UserId::new(seller.as_str()))
                || product.name.to_lowercase().contains(&needle)
        })
        .map(|(seller, key, product)| with_ids(&seller, key, product))
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// GET /products/search?query=
///
/// Matches product names and the names of their owners.
///
/// # Errors
///
/// 422 without a query.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<ApiResponse<Vec<Product>>> {
    require("query", query.query.as_deref())?;
    let needle = query.query.unwrap_or_default();

    let owners: HashSet<UserId> = find_users_by_name(state.store(), &needle)
        .await?
        .into_iter()
        .map(|user| user.uid)
        .collect();
    let products = find_products(state.store(), &needle, &owners).await?;
    Ok(ok(products))
}
