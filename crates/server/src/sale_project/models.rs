use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::input::SaleProjectPatch;
use crate::api::response::Pagination;
use crate::media::MediaAsset;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SaleCategory {
    #[default]
    React,
    Angular,
    Java,
    Dotnet,
    Csharp,
    Node,
    Python,
    Other,
}

/// A ready-made project offered for sale.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleProjectRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub category: SaleCategory,
    pub technologies: Json<Vec<String>>,
    pub duration: String,
    pub implementation_guide: String,
    pub features: Json<Vec<String>>,
    pub includes: Json<Vec<String>>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub contact_url: Option<String>,
    pub thumbnail: Json<MediaAsset>,
    pub images: Json<Vec<MediaAsset>>,
    pub is_visible: bool,
    pub is_featured: bool,
    #[serde(rename = "order")]
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleProjectRecord {
    pub fn draft(thumbnail: MediaAsset) -> Self {
        let now = Utc::now();
        Self {
            id: cuid2::create_id(),
            title: String::new(),
            slug: String::new(),
            short_description: String::new(),
            description: String::new(),
            price: 0.0,
            currency: Currency::default(),
            category: SaleCategory::default(),
            technologies: Json(Vec::new()),
            duration: String::new(),
            implementation_guide: String::new(),
            features: Json(Vec::new()),
            includes: Json(Vec::new()),
            demo_url: None,
            github_url: None,
            contact_url: None,
            thumbnail: Json(thumbnail),
            images: Json(Vec::new()),
            is_visible: true,
            is_featured: false,
            order_index: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: SaleProjectPatch) {
        let SaleProjectPatch {
            title,
            short_description,
            description,
            price,
            currency,
            category,
            technologies,
            duration,
            implementation_guide,
            features,
            includes,
            demo_url,
            github_url,
            contact_url,
            thumbnail,
            is_visible,
            is_featured,
            order,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(short_description) = short_description {
            self.short_description = short_description;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(currency) = currency {
            self.currency = currency;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(technologies) = technologies {
            self.technologies = Json(technologies);
        }
        if let Some(duration) = duration {
            self.duration = duration;
        }
        if let Some(guide) = implementation_guide {
            self.implementation_guide = guide;
        }
        if let Some(features) = features {
            self.features = Json(features);
        }
        if let Some(includes) = includes {
            self.includes = Json(includes);
        }
        if let Some(demo_url) = demo_url {
            self.demo_url = demo_url;
        }
        if let Some(github_url) = github_url {
            self.github_url = github_url;
        }
        if let Some(contact_url) = contact_url {
            self.contact_url = contact_url;
        }
        if let Some(thumbnail) = thumbnail {
            self.thumbnail = Json(thumbnail);
        }
        if let Some(is_visible) = is_visible {
            self.is_visible = is_visible;
        }
        if let Some(is_featured) = is_featured {
            self.is_featured = is_featured;
        }
        if let Some(order) = order {
            self.order_index = order;
        }
        self.updated_at = Utc::now();
    }
}

pub const SALE_SORT_COLUMNS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("title", "title"),
    ("order", "order_index"),
    ("price", "price"),
    ("isFeatured", "is_featured"),
    ("category", "category"),
];

#[derive(Debug, Serialize)]
pub struct SaleProjectPage {
    pub items: Vec<SaleProjectRecord>,
    pub pagination: Pagination,
}
