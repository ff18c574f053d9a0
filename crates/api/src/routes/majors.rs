//! Major route handlers.

use axum::extract::{Path, State};
use serde::Deserialize;

use skillx_core::{Collection, MajorId, RecordPath};

use crate::error::{AppError, Result, require};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Major;
use crate::routes::{ApiJson, ApiResponse, created, done, ok};
use crate::services::TaxonomyResolver;
use crate::state::AppState;

/// GET /majors
///
/// # Errors
///
/// 500 on store failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
) -> Result<ApiResponse<Vec<Major>>> {
    let majors = TaxonomyResolver::new(state.store()).majors().await?;
    Ok(ok(majors))
}

/// GET /majors/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(id): Path<MajorId>,
) -> Result<ApiResponse<Major>> {
    let major = TaxonomyResolver::new(state.store()).major(&id).await?;
    Ok(ok(major))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewMajor {
    #[serde(rename = "titleMajor")]
    pub title: String,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
    pub link: String,
}

/// POST /majors
///
/// # Errors
///
/// 422 when `titleMajor`, `iconUrl` or `link` is blank.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<NewMajor>,
) -> Result<ApiResponse<Major>> {
    require("titleMajor", Some(&body.title))?;
    require("iconUrl", Some(&body.icon_url))?;
    require("link", Some(&body.link))?;

    let major = Major {
        id: MajorId::generate(),
        title: body.title.trim().to_string(),
        icon_url: body.icon_url.trim().to_string(),
        link: body.link.trim().to_string(),
    };
    let path = RecordPath::record(Collection::Majors, &major.id)?;
    state.store().set(&path, &major).await?;

    tracing::info!(admin = %admin.uid, major_id = %major.id, "Major created");
    Ok(created("Major created successfully", major))
}

/// DELETE /majors/{id}
///
/// Categories filed under the major are left in place.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MajorId>,
) -> Result<ApiResponse<()>> {
    let path = RecordPath::record(Collection::Majors, &id)?;
    if !state.store().exists(&path).await? {
        return Err(AppError::NotFound("Major not found".to_string()));
    }
    state.store().delete(&path).await?;

    tracing::info!(admin = %admin.uid, major_id = %id, "Major deleted");
    Ok(done("Major deleted successfully"))
}
