//! Category route handlers.
//!
//! Categories are created against a major title and thereafter refer to the
//! major by id.

use axum::extract::{Path, State};
use serde::Deserialize;

use skillx_core::{CategoryId, Collection, MajorId, RecordPath, apply_nonblank};

use crate::error::{AppError, Result, require};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Category;
use crate::routes::{ApiJson, ApiResponse, created, done, ok, ok_with_message};
use crate::services::TaxonomyResolver;
use crate::state::AppState;

/// GET /categories
///
/// # Errors
///
/// 500 on store failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
) -> Result<ApiResponse<Vec<Category>>> {
    let categories = TaxonomyResolver::new(state.store()).categories().await?;
    Ok(ok(categories))
}

/// GET /categories/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(id): Path<CategoryId>,
) -> Result<ApiResponse<Category>> {
    let category = TaxonomyResolver::new(state.store()).category(&id).await?;
    Ok(ok(category))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewCategory {
    pub title: String,
    pub photo_url: String,
    pub title_major: String,
}

/// POST /categories
///
/// `title_major` must match a registered major exactly.
///
/// # Errors
///
/// 422 for a blank field, 404 when the major is unknown. Nothing is written
/// on error.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<NewCategory>,
) -> Result<ApiResponse<Category>> {
    require("title", Some(&body.title))?;
    require("photo_url", Some(&body.photo_url))?;
    require("title_major", Some(&body.title_major))?;

    let id_major = TaxonomyResolver::new(state.store())
        .resolve_major_id_by_title(&body.title_major)
        .await?;

    let category = Category {
        id: CategoryId::generate(),
        title: body.title.trim().to_string(),
        photo_url: body.photo_url.trim().to_string(),
        id_major,
    };
    let path = RecordPath::record(Collection::Categories, &category.id)?;
    state.store().set(&path, &category).await?;

    tracing::info!(
        admin = %admin.uid,
        category_id = %category.id,
        major_id = %category.id_major,
        "Category created"
    );
    Ok(created("Category created successfully", category))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryPatch {
    pub title: Option<String>,
    pub photo_url: Option<String>,
    pub id_major: Option<MajorId>,
}

/// PUT /categories/{id}
///
/// Blank fields are ignored; a new `id_major` must exist.
///
/// # Errors
///
/// 404 for an unknown category or major.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<ApiResponse<Category>> {
    let resolver = TaxonomyResolver::new(state.store());
    let mut category = resolver.category(&id).await?;

    apply_nonblank(&mut category.title, patch.title);
    apply_nonblank(&mut category.photo_url, patch.photo_url);
    if let Some(id_major) = patch.id_major.filter(|m| !m.is_blank()) {
        category.id_major = resolver.major(&id_major).await?.id;
    }

    let path = RecordPath::record(Collection::Categories, &id)?;
    state.store().set(&path, &category).await?;
    Ok(ok_with_message("Category updated successfully", category))
}

/// DELETE /categories/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<ApiResponse<()>> {
    let path = RecordPath::record(Collection::Categories, &id)?;
    if !state.store().exists(&path).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }
    state.store().delete(&path).await?;
    Ok(done("Category deleted successfully"))
}
