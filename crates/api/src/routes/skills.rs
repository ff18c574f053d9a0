//! Skill catalogue and per-user skill handlers.

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use skillx_core::{Collection, RecordPath, SkillId, apply_nonblank};

use crate::error::{AppError, Result, require};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Skill, UserSkill};
use crate::routes::{ApiJson, ApiResponse, created, done, ok, ok_with_message};
use crate::state::AppState;
use crate::store::Store;

async fn load_skill(store: &Store, id: &SkillId) -> Result<Skill> {
    let path = RecordPath::record(Collection::Skills, id)?;
    let mut skill: Skill = store
        .get(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("Skill not found".to_string()))?;
    skill.id = id.clone();
    Ok(skill)
}

// =============================================================================
// Catalogue
// =============================================================================

/// GET /skills
///
/// # Errors
///
/// 500 on store failure.
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Skill>>> {
    let rows: Vec<(String, Skill)> = state
        .store()
        .list(&RecordPath::collection(Collection::Skills))
        .await?;
    let mut skills: Vec<Skill> = rows
        .into_iter()
        .map(|(key, mut skill)| {
            skill.id = SkillId::new(key);
            skill
        })
        .collect();
    skills.sort_by(|a, b| a.title_skill.cmp(&b.title_skill));
    Ok(ok(skills))
}

/// GET /skills/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<SkillId>,
) -> Result<ApiResponse<Skill>> {
    Ok(ok(load_skill(state.store(), &id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillInput {
    pub title_skill: String,
}

/// POST /skills
///
/// # Errors
///
/// 422 without `title_skill`.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<SkillInput>,
) -> Result<ApiResponse<Skill>> {
    require("title_skill", Some(&body.title_skill))?;

    let skill = Skill {
        id: SkillId::generate(),
        title_skill: body.title_skill.trim().to_string(),
    };
    let path = RecordPath::record(Collection::Skills, &skill.id)?;
    state.store().set(&path, &skill).await?;
    Ok(created("Skill created successfully", skill))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillPatch {
    pub title_skill: Option<String>,
}

/// PUT /skills/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<SkillId>,
    ApiJson(patch): ApiJson<SkillPatch>,
) -> Result<ApiResponse<Skill>> {
    let mut skill = load_skill(state.store(), &id).await?;
    apply_nonblank(&mut skill.title_skill, patch.title_skill);

    let path = RecordPath::record(Collection::Skills, &id)?;
    state.store().set(&path, &skill).await?;
    Ok(ok_with_message("Skill updated successfully", skill))
}

/// DELETE /skills/{id}
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<SkillId>,
) -> Result<ApiResponse<()>> {
    load_skill(state.store(), &id).await?;
    let path = RecordPath::record(Collection::Skills, &id)?;
    state.store().delete(&path).await?;
    Ok(done("Skill deleted successfully"))
}

// =============================================================================
// Caller's skills
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttachSkill {
    pub id_skill: SkillId,
    pub level: Option<String>,
}

/// POST /user/skills
///
/// Attaching the same skill again replaces the stored level.
///
/// # Errors
///
/// 422 without `id_skill`, 404 for an unknown skill.
pub async fn attach(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<AttachSkill>,
) -> Result<ApiResponse<UserSkill>> {
    if body.id_skill.is_blank() {
        return Err(AppError::MissingField("id_skill"));
    }
    let skill = load_skill(state.store(), &body.id_skill).await?;

    let link = UserSkill {
        user_id: caller.uid.clone(),
        id_skill: skill.id,
        title_skill: skill.title_skill,
        level: body.level.filter(|l| !l.trim().is_empty()),
        created_at: Utc::now(),
    };
    let path = RecordPath::nested(Collection::UserSkills, &caller.uid, &link.id_skill)?;
    state.store().set(&path, &link).await?;
    Ok(created("Skill added successfully", link))
}

/// GET /user/skills
///
/// # Errors
///
/// 500 on store failure.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<Vec<UserSkill>>> {
    let path = RecordPath::record(Collection::UserSkills, &caller.uid)?;
    let rows: Vec<(String, UserSkill)> = state.store().list(&path).await?;
    Ok(ok(rows
        .into_iter()
        .map(|(key, mut link)| {
            link.user_id = caller.uid.clone();
            link.id_skill = SkillId::new(key);
            link
        })
        .collect()))
}
