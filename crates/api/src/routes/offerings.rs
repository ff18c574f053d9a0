//! Service (taxonomy leaf) route handlers.
//!
//! Named `offerings` to keep these apart from the `services` layer.

use axum::extract::{Path, State};
use serde::Deserialize;

use skillx_core::{Collection, RecordPath, ServiceId, apply_nonblank};

use crate::error::{AppError, Result, require};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Service;
use crate::routes::{ApiJson, ApiQuery, ApiResponse, created, done, ok, ok_with_message};
use crate::services::TaxonomyResolver;
use crate::state::AppState;

/// GET /services
///
/// # Errors
///
/// 500 on store failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
) -> Result<ApiResponse<Vec<Service>>> {
    let services = TaxonomyResolver::new(state.store()).services().await?;
    Ok(ok(services))
}

/// GET /services/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(id): Path<ServiceId>,
) -> Result<ApiResponse<Service>> {
    let service = TaxonomyResolver::new(state.store()).service(&id).await?;
    Ok(ok(service))
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

/// GET /services/by-title?title=
///
/// # Errors
///
/// 422 without a title, 404 when nothing matches.
pub async fn by_title(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    ApiQuery(query): ApiQuery<TitleQuery>,
) -> Result<ApiResponse<Service>> {
    require("title", query.title.as_deref())?;
    let title = query.title.unwrap_or_default();
    let service = TaxonomyResolver::new(state.store())
        .resolve_service_by_title(&title)
        .await?;
    Ok(ok(service))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewService {
    pub title_service: String,
    pub icon_url: String,
    pub title_category: String,
}

/// POST /services
///
/// # Errors
///
/// 422 for a blank field, 404 when the category title is unknown.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<NewService>,
) -> Result<ApiResponse<Service>> {
    require("title_service", Some(&body.title_service))?;
    require("icon_url", Some(&body.icon_url))?;
    require("title_category", Some(&body.title_category))?;

    let id_category = TaxonomyResolver::new(state.store())
        .resolve_category_id_by_title(&body.title_category)
        .await?;

    let service = Service {
        id: ServiceId::generate(),
        title_service: body.title_service.trim().to_string(),
        icon_url: body.icon_url.trim().to_string(),
        id_category,
    };
    let path = RecordPath::record(Collection::Services, &service.id)?;
    state.store().set(&path, &service).await?;

    tracing::info!(
        admin = %admin.uid,
        service_id = %service.id,
        category_id = %service.id_category,
        "Service created"
    );
    Ok(created("Service created successfully", service))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServicePatch {
    pub title_service: Option<String>,
    pub icon_url: Option<String>,
    pub title_category: Option<String>,
}

/// PUT /services/{id}
///
/// Blank fields are ignored; a new `title_category` must resolve.
///
/// # Errors
///
/// 404 for an unknown service or category.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ServiceId>,
    ApiJson(patch): ApiJson<ServicePatch>,
) -> Result<ApiResponse<Service>> {
    let resolver = TaxonomyResolver::new(state.store());
    let mut service = resolver.service(&id).await?;

    apply_nonblank(&mut service.title_service, patch.title_service);
    apply_nonblank(&mut service.icon_url, patch.icon_url);
    if let Some(title) = patch.title_category.filter(|t| !t.trim().is_empty()) {
        service.id_category = resolver.resolve_category_id_by_title(&title).await?;
    }

    let path = RecordPath::record(Collection::Services, &id)?;
    state.store().set(&path, &service).await?;
    Ok(ok_with_message("Service updated successfully", service))
}

/// DELETE /services/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ServiceId>,
) -> Result<ApiResponse<()>> {
    let path = RecordPath::record(Collection::Services, &id)?;
    if !state.store().exists(&path).await? {
        return Err(AppError::NotFound("Service not found".to_string()));
    }
    state.store().delete(&path).await?;
    Ok(done("Service deleted successfully"))
}
