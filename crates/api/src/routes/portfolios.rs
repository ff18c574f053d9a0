//! Portfolio route handlers.
//!
//! Writes always target `portfolios/{caller}/{id}`; `user_id` in a body is
//! ignored.

use axum::extract::{Path, State};
use serde::Deserialize;

use skillx_core::{Collection, PortfolioId, RecordPath, UserId, apply_nonblank, apply_present};

use crate::error::{AppError, Result, require};
use crate::middleware::RequireAuth;
use crate::models::Portfolio;
use crate::routes::{ApiJson, ApiResponse, created, done, ok, ok_with_message};
use crate::state::AppState;
use crate::store::Store;

async fn list_for(store: &Store, uid: &UserId) -> Result<Vec<Portfolio>> {
    let path = RecordPath::record(Collection::Portfolios, uid)?;
    let rows: Vec<(String, Portfolio)> = store.list(&path).await?;
    Ok(rows
        .into_iter()
        .map(|(key, mut portfolio)| {
            portfolio.id = PortfolioId::new(key);
            portfolio.user_id = uid.clone();
            portfolio
        })
        .collect())
}

/// GET /user/portfolios
///
/// # Errors
///
/// 500 on store failure.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<Vec<Portfolio>>> {
    Ok(ok(list_for(state.store(), &caller.uid).await?))
}

/// GET /users/{uid}/portfolios
///
/// # Errors
///
/// 400 for an illegal uid.
pub async fn of_user(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(uid): Path<UserId>,
) -> Result<ApiResponse<Vec<Portfolio>>> {
    Ok(ok(list_for(state.store(), &uid).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPortfolio {
    pub title: String,
    pub description: String,
    pub link: String,
    pub photo: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub date_created: String,
    pub date_end: String,
    pub is_present: bool,
}

/// POST /user/portfolios
///
/// # Errors
///
/// 422 without a title.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<NewPortfolio>,
) -> Result<ApiResponse<Portfolio>> {
    require("title", Some(&body.title))?;

    let portfolio = Portfolio {
        id: PortfolioId::generate(),
        user_id: caller.uid.clone(),
        title: body.title.trim().to_string(),
        description: body.description,
        link: body.link,
        photo: body.photo,
        kind: body.kind,
        status: body.status,
        date_created: body.date_created,
        date_end: body.date_end,
        is_present: body.is_present,
    };
    let path = RecordPath::nested(Collection::Portfolios, &caller.uid, &portfolio.id)?;
    state.store().set(&path, &portfolio).await?;
    Ok(created("Portfolio created successfully", portfolio))
}

/// Partial portfolio update.
///
/// Text that identifies the entry (`title`, `description`, `link`,
/// `date_created`) ignores blanks; the remaining fields take whatever is sent,
/// so `""` clears them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortfolioPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub date_created: Option<String>,
    pub photo: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub date_end: Option<String>,
    pub is_present: Option<bool>,
}

impl PortfolioPatch {
    fn apply(self, portfolio: &mut Portfolio) {
        apply_nonblank(&mut portfolio.title, self.title);
        apply_nonblank(&mut portfolio.description, self.description);
        apply_nonblank(&mut portfolio.link, self.link);
        apply_nonblank(&mut portfolio.date_created, self.date_created);
        apply_present(&mut portfolio.photo, self.photo);
        apply_present(&mut portfolio.kind, self.kind);
        apply_present(&mut portfolio.status, self.status);
        apply_present(&mut portfolio.date_end, self.date_end);
        apply_present(&mut portfolio.is_present, self.is_present);
    }
}

/// PUT /user/portfolios/{id}
///
/// # Errors
///
/// 404 when the caller has no such entry.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<PortfolioId>,
    ApiJson(patch): ApiJson<PortfolioPatch>,
) -> Result<ApiResponse<Portfolio>> {
    let path = RecordPath::nested(Collection::Portfolios, &caller.uid, &id)?;
    let mut portfolio: Portfolio = state
        .store()
        .get(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))?;

    patch.apply(&mut portfolio);
    portfolio.id = id;
    portfolio.user_id = caller.uid.clone();

    state.store().set(&path, &portfolio).await?;
    Ok(ok_with_message("Portfolio updated successfully", portfolio))
}

/// DELETE /user/portfolios/{id}
///
/// # Errors
///
/// 404 when the caller has no such entry.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<PortfolioId>,
) -> Result<ApiResponse<()>> {
    let path = RecordPath::nested(Collection::Portfolios, &caller.uid, &id)?;
    if !state.store().exists(&path).await? {
        return Err(AppError::NotFound("Portfolio not found".to_string()));
    }
    state.store().delete(&path).await?;
    Ok(done("Portfolio deleted successfully"))
}
