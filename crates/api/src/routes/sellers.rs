//! Seller application route handlers.
//!
//! A user applies once; an admin accepts or denies. Accepting marks both the
//! application and the user as verified, which is what allows the user to
//! switch their role to seller.

use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use skillx_core::{Collection, RecordPath, SellerDecision, SellerStatus, UserId};

use crate::error::{AppError, Result, require};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{RegisterSeller, UserView};
use crate::routes::users::load_user;
use crate::routes::{ApiJson, ApiResponse, created, done, ok, ok_with_message};
use crate::services::TaxonomyResolver;
use crate::state::AppState;

fn application_path(uid: &UserId) -> Result<RecordPath> {
    Ok(RecordPath::record(Collection::RegisterSellers, uid)?)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SellerRequest {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub major: String,
    pub photo_url: String,
    pub graduation_month: String,
    pub graduation_year: Option<i32>,
}

/// POST /user/request-seller
///
/// Name and email fall back to the caller's profile when omitted.
///
/// # Errors
///
/// 409 if the caller already applied, 422 without a major, 404 when the
/// major is not registered.
pub async fn request(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<SellerRequest>,
) -> Result<ApiResponse<RegisterSeller>> {
    require("major", Some(&body.major))?;

    let path = application_path(&caller.uid)?;
    if state.store().exists(&path).await? {
        return Err(AppError::Conflict(
            "User has already submitted a request".to_string(),
        ));
    }

    let major = TaxonomyResolver::new(state.store())
        .resolve_major_by_title_ignore_case(&body.major)
        .await?;
    let user = load_user(state.store(), &caller.uid).await?;

    let now = Utc::now();
    let application = RegisterSeller {
        uid: caller.uid.clone(),
        name: or_profile(body.name, user.name),
        email: or_profile(body.email, user.email),
        organization: or_profile(body.organization, user.organization),
        major: major.title,
        photo_url: body.photo_url,
        status: SellerStatus::Pending,
        verified: false,
        graduation_month: body.graduation_month,
        graduation_year: body.graduation_year,
        about_me: String::new(),
        created_at: now,
        updated_at: now,
    };
    state.store().set(&path, &application).await?;

    tracing::info!(uid = %caller.uid, "Seller application submitted");
    Ok(created("Seller request submitted", application))
}

fn or_profile(sent: String, stored: String) -> String {
    if sent.trim().is_empty() { stored } else { sent }
}

/// GET /user/request-seller-status
///
/// # Errors
///
/// 404 when the caller never applied.
pub async fn status(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<Value>> {
    let application: RegisterSeller = state
        .store()
        .get(&application_path(&caller.uid)?)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No registerSeller data found for this user".to_string())
        })?;
    Ok(ok(json!({ "status": application.status })))
}

#[derive(Debug, Serialize)]
pub struct SellerData {
    pub user: UserView,
    #[serde(rename = "registerSeller")]
    pub register_seller: Option<RegisterSeller>,
}

/// GET /user/seller-data
///
/// # Errors
///
/// 404 when the caller has no profile.
pub async fn seller_data(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<SellerData>> {
    let user = load_user(state.store(), &caller.uid).await?;
    let register_seller = state.store().get(&application_path(&caller.uid)?).await?;
    Ok(ok(SellerData {
        user: user.into(),
        register_seller,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AboutMeRequest {
    #[serde(default)]
    pub about_me: String,
}

#[derive(Serialize)]
struct AboutMeFields<'a> {
    about_me: &'a str,
    updated_at: chrono::DateTime<Utc>,
}

/// PUT /user/about-me
///
/// # Errors
///
/// 422 for blank text, 404 when the caller never applied.
pub async fn about_me(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<AboutMeRequest>,
) -> Result<ApiResponse<()>> {
    require("about_me", Some(&body.about_me))?;

    let path = application_path(&caller.uid)?;
    if !state.store().exists(&path).await? {
        return Err(AppError::NotFound("Seller application not found".to_string()));
    }
    state
        .store()
        .update(
            &path,
            &AboutMeFields {
                about_me: body.about_me.trim(),
                updated_at: Utc::now(),
            },
        )
        .await?;
    Ok(done("AboutMe updated successfully"))
}

/// GET /sellers
///
/// # Errors
///
/// 500 on store failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
) -> Result<ApiResponse<Vec<RegisterSeller>>> {
    let rows: Vec<(String, RegisterSeller)> = state
        .store()
        .list(&RecordPath::collection(Collection::RegisterSellers))
        .await?;
    Ok(ok(rows
        .into_iter()
        .map(|(key, mut application)| {
            application.uid = UserId::new(key);
            application
        })
        .collect()))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub uid: UserId,
    pub status: SellerDecision,
}

#[derive(Serialize)]
struct VerifiedField {
    verified: bool,
}

/// POST /admin/verify-seller
///
/// `accepted` sets `verified` on the application and on the user; `denied`
/// only records the status.
///
/// # Errors
///
/// 422 without `uid`, 404 when there is no application.
pub async fn verify(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<VerifyRequest>,
) -> Result<ApiResponse<RegisterSeller>> {
    if body.uid.is_blank() {
        return Err(AppError::MissingField("uid"));
    }
    let path = application_path(&body.uid)?;
    let mut application: RegisterSeller = state
        .store()
        .get(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("RegisterSeller not found".to_string()))?;

    application.uid = body.uid.clone();
    application.status = body.status.into();
    application.updated_at = Utc::now();
    if body.status == SellerDecision::Accepted {
        application.verified = true;
    }
    state.store().set(&path, &application).await?;

    if body.status == SellerDecision::Accepted {
        let user_path = RecordPath::record(Collection::Users, &body.uid)?;
        state
            .store()
            .update(&user_path, &VerifiedField { verified: true })
            .await?;
    }

    tracing::info!(
        admin = %admin.uid,
        uid = %body.uid,
        status = ?application.status,
        "Seller application reviewed"
    );
    Ok(ok_with_message(
        "Seller verification status updated",
        application,
    ))
}
