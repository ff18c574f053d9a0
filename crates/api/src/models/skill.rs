//! Skills catalogue and per-user skill links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillx_core::{SkillId, UserId};

/// A skill users can attach to their profile (`skills/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    #[serde(rename = "id_skill")]
    pub id: SkillId,
    pub title_skill: String,
}

/// Link from a user to a skill (`user_skills/{uid}/{skill_id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSkill {
    pub user_id: UserId,
    pub id_skill: SkillId,
    pub title_skill: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub created_at: DateTime<Utc>,
}
