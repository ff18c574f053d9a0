//! Combined user and product search.

use std::collections::HashSet;

use axum::extract::State;
use serde::Serialize;

use skillx_core::UserId;

use crate::error::{Result, require};
use crate::models::{Product, UserView};
use crate::routes::products::{SearchQuery, find_products};
use crate::routes::users::find_users_by_name;
use crate::routes::{ApiQuery, ApiResponse, ok};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub users: Vec<UserView>,
    pub products: Vec<Product>,
}

/// GET /search?query=
///
/// Users by name, and products by name or by a matching owner.
///
/// # Errors
///
/// 422 without a query.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<ApiResponse<SearchResults>> {
    require("query", query.query.as_deref())?;
    let needle = query.query.unwrap_or_default();

    let users = find_users_by_name(state.store(), &needle).await?;
    let owners: HashSet<UserId> = users.iter().map(|user| user.uid.clone()).collect();
    let products = find_products(state.store(), &needle, &owners).await?;

    Ok(ok(SearchResults { users, products }))
}
