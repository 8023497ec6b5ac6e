use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::input::ProjectPatch;
use crate::api::response::Pagination;
use crate::media::MediaAsset;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProjectCategory {
    #[default]
    Web,
    Mobile,
    Desktop,
    Api,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Completed,
    InProgress,
    Planned,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub long_description: Option<String>,
    pub thumbnail: Json<MediaAsset>,
    pub images: Json<Vec<MediaAsset>>,
    pub technologies: Json<Vec<String>>,
    pub category: ProjectCategory,
    pub live_url: Option<String>,
    pub github_url: Option<String>,
    pub featured: bool,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "order")]
    pub order_index: i64,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// A new, not yet persisted project. The slug is assigned on insert.
    pub fn draft(thumbnail: MediaAsset) -> Self {
        let now = Utc::now();
        Self {
            id: cuid2::create_id(),
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            long_description: None,
            thumbnail: Json(thumbnail),
            images: Json(Vec::new()),
            technologies: Json(Vec::new()),
            category: ProjectCategory::default(),
            live_url: None,
            github_url: None,
            featured: false,
            status: ProjectStatus::default(),
            start_date: None,
            end_date: None,
            order_index: 0,
            is_visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every field present in `patch`. The slug is never touched.
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(long_description) = patch.long_description {
            self.long_description = long_description;
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = Json(thumbnail);
        }
        if let Some(technologies) = patch.technologies {
            self.technologies = Json(technologies);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(live_url) = patch.live_url {
            self.live_url = live_url;
        }
        if let Some(github_url) = patch.github_url {
            self.github_url = github_url;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(order) = patch.order {
            self.order_index = order;
        }
        if let Some(is_visible) = patch.is_visible {
            self.is_visible = is_visible;
        }
        self.updated_at = Utc::now();
    }
}

/// Sortable fields of the public listing, by wire name.
pub const PROJECT_SORT_COLUMNS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("title", "title"),
    ("order", "order_index"),
    ("featured", "featured"),
    ("status", "status"),
    ("category", "category"),
    ("startDate", "start_date"),
    ("endDate", "end_date"),
];

#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectRecord>,
    pub pagination: Pagination,
}
