//! User profile route handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use skillx_core::{Collection, RecordPath, SelfAssignableRole, UserId, apply_nonblank};

use crate::error::{AppError, Result, require};
use crate::middleware::RequireAuth;
use crate::models::{User, UserView};
use crate::routes::{ApiJson, ApiQuery, ApiResponse, ok, ok_with_message};
use crate::services::TaxonomyResolver;
use crate::state::AppState;
use crate::store::Store;

/// Load `users/{uid}` or fail with 404.
pub(crate) async fn load_user(store: &Store, uid: &UserId) -> Result<User> {
    let path = RecordPath::record(Collection::Users, uid)?;
    let mut user: User = store
        .get(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    user.uid = uid.clone();
    Ok(user)
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub uid: Option<String>,
}

/// GET /user?uid=
///
/// The stored major title is expanded to `{"idMajor", "titleMajor"}`.
///
/// # Errors
///
/// 422 without `uid`, 404 for an unknown user.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    ApiQuery(query): ApiQuery<ProfileQuery>,
) -> Result<ApiResponse<Value>> {
    require("uid", query.uid.as_deref())?;
    let uid = UserId::new(query.uid.unwrap_or_default().trim());
    let user = load_user(state.store(), &uid).await?;

    let major_id = if user.major.is_empty() {
        String::new()
    } else {
        // A profile may name a major that was renamed or deleted since.
        TaxonomyResolver::new(state.store())
            .resolve_major_id_by_title(&user.major)
            .await
            .map(String::from)
            .unwrap_or_default()
    };
    let major = json!({ "idMajor": major_id, "titleMajor": user.major });

    let mut profile = serde_json::to_value(UserView::from(user))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if let Value::Object(fields) = &mut profile {
        fields.insert("major".to_string(), major);
    }
    Ok(ok(profile))
}

/// `major` may be sent as a bare title or as `{"titleMajor": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MajorInput {
    Title(String),
    Object {
        #[serde(rename = "titleMajor")]
        title: String,
    },
}

impl MajorInput {
    fn title(&self) -> &str {
        match self {
            Self::Title(t) | Self::Object { title: t } => t.trim(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub language: Option<String>,
    pub photo_url: Option<String>,
    pub major: Option<MajorInput>,
}

/// PUT /user/update
///
/// Blank text fields are ignored. An unregistered major leaves the stored one
/// in place and is reported in `warnings`.
///
/// # Errors
///
/// 404 when the caller has no profile.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<ApiResponse<Value>> {
    let mut user = load_user(state.store(), &caller.uid).await?;
    let mut warnings = Vec::new();

    apply_nonblank(&mut user.name, patch.name);
    apply_nonblank(&mut user.organization, patch.organization);
    apply_nonblank(&mut user.language, patch.language);
    apply_nonblank(&mut user.photo_url, patch.photo_url);

    if let Some(major) = patch.major {
        let title = major.title();
        match TaxonomyResolver::new(state.store())
            .resolve_major_by_title(title)
            .await
        {
            Ok(found) => user.major = found.title,
            Err(crate::services::TaxonomyError::Store(e)) => return Err(e.into()),
            Err(_) => {
                tracing::debug!(major = title, "Ignoring unregistered major");
                warnings.push(
                    "Provided major is not registered. Major field will not be updated."
                        .to_string(),
                );
            }
        }
    }

    let path = RecordPath::record(Collection::Users, &caller.uid)?;
    state.store().set(&path, &user).await?;

    Ok(ok_with_message(
        "User updated successfully",
        json!({ "uid": caller.uid, "warnings": warnings }),
    ))
}

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: SelfAssignableRole,
}

#[derive(Serialize)]
struct RoleField {
    role: skillx_core::Role,
}

/// POST /user/change-role
///
/// # Errors
///
/// 403 when switching to seller without a verified account.
pub async fn change_role(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<ChangeRoleRequest>,
) -> Result<ApiResponse<Value>> {
    let user = load_user(state.store(), &caller.uid).await?;
    if body.role == SelfAssignableRole::Seller && !user.verified {
        return Err(AppError::Forbidden(
            "User is not verified to become a seller".to_string(),
        ));
    }

    let role = body.role.into();
    let path = RecordPath::record(Collection::Users, &caller.uid)?;
    state.store().update(&path, &RoleField { role }).await?;

    Ok(ok_with_message(
        "Role updated successfully",
        json!({ "role": role }),
    ))
}

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Users whose name contains `needle`, ignoring case.
pub(crate) async fn find_users_by_name(store: &Store, needle: &str) -> Result<Vec<UserView>> {
    let needle = needle.trim().to_lowercase();
    let users: Vec<(String, User)> = store
        .list(&RecordPath::collection(Collection::Users))
        .await?;

    Ok(users
        .into_iter()
        .filter(|(_, user)| user.name.to_lowercase().contains(&needle))
        .map(|(key, mut user)| {
            user.uid = UserId::new(key);
            UserView::from(user)
        })
        .collect())
}

/// GET /users/search?query=
///
/// # Errors
///
/// 422 without a query.
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<ApiResponse<Vec<UserView>>> {
    require("query", query.query.as_deref())?;
    let users = find_users_by_name(state.store(), query.query.as_deref().unwrap_or_default()).await?;
    Ok(ok(users))
}
