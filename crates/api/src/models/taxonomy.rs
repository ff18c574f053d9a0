//! Majors, categories and services.
//!
//! The taxonomy is a three-level tree linked by parent ids:
//! a category names its major, a service names its category.

use serde::{Deserialize, Serialize};

use skillx_core::{CategoryId, MajorId, ServiceId};

/// An academic major (`majors/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Major {
    #[serde(rename = "idMajor")]
    pub id: MajorId,
    #[serde(rename = "titleMajor")]
    pub title: String,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
    pub link: String,
}

/// A product category belonging to one major (`categories/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(rename = "id_category")]
    pub id: CategoryId,
    pub title: String,
    pub photo_url: String,
    pub id_major: MajorId,
}

/// A service type belonging to one category (`services/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    #[serde(rename = "id_service")]
    pub id: ServiceId,
    pub title_service: String,
    pub icon_url: String,
    pub id_category: CategoryId,
}
