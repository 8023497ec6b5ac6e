use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ApiResult;
use crate::validation::is_hex_color;
use crate::validation::payload::{Payload, Violations, order_field};

pub const DEFAULT_SKILL_COLOR: &str = "#667eea";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Database,
    Devops,
    Tools,
    Other,
}

impl SkillCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Frontend => "frontend",
            SkillCategory::Backend => "backend",
            SkillCategory::Database => "database",
            SkillCategory::Devops => "devops",
            SkillCategory::Tools => "tools",
            SkillCategory::Other => "other",
        }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: SkillCategory,
    pub proficiency: i64,
    pub icon: Option<String>,
    pub color: String,
    #[serde(rename = "order")]
    pub order_index: i64,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub category: Option<SkillCategory>,
    pub proficiency: Option<i64>,
    pub icon: Option<Option<String>>,
    pub color: Option<String>,
    pub order: Option<i64>,
    pub is_visible: Option<bool>,
}

impl SkillPatch {
    pub fn from_payload(payload: &Payload) -> ApiResult<Self> {
        let mut violations = Violations::new();

        let name = payload.text("name");
        if let Some(name) = &name {
            violations.length("name", name, 1, 50, "Name must be between 1 and 50 characters");
        }
        let proficiency = violations.take(
            "proficiency",
            payload.integer("proficiency"),
            "Proficiency must be between 0 and 100",
        );
        if proficiency.is_some_and(|p| !(0..=100).contains(&p)) {
            violations.add("proficiency", "Proficiency must be between 0 and 100");
        }
        let color = payload.non_empty_text("color");
        if let Some(color) = &color {
            violations.check(is_hex_color(color), "color", "Please enter a valid hex color");
        }

        let patch = SkillPatch {
            name,
            category: violations.take("category", payload.choice("category"), "Invalid category"),
            proficiency,
            icon: payload.clearable_text("icon"),
            color,
            order: order_field(&mut violations, payload),
            is_visible: violations.take(
                "isVisible",
                payload.flag("isVisible"),
                "Visibility must be a boolean",
            ),
        };

        violations.finish()?;
        Ok(patch)
    }

    pub fn check_required(&self) -> ApiResult<()> {
        let mut violations = Violations::new();
        violations.check(self.name.is_some(), "name", "Skill name is required");
        violations.check(self.category.is_some(), "category", "Category is required");
        violations.check(self.proficiency.is_some(), "proficiency", "Proficiency is required");
        violations.finish()
    }
}

impl SkillRecord {
    /// Builds a new skill from a patch that passed [`SkillPatch::check_required`].
    pub fn from_patch(patch: SkillPatch) -> Option<Self> {
        let now = Utc::now();
        let mut skill = SkillRecord {
            id: cuid2::create_id(),
            name: String::new(),
            category: patch.category?,
            proficiency: 0,
            icon: None,
            color: DEFAULT_SKILL_COLOR.to_string(),
            order_index: 0,
            is_visible: true,
            created_at: now,
            updated_at: now,
        };
        skill.apply(patch);
        Some(skill)
    }

    pub fn apply(&mut self, patch: SkillPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(proficiency) = patch.proficiency {
            self.proficiency = proficiency;
        }
        if let Some(icon) = patch.icon {
            self.icon = icon;
        }
        if let Some(color) = patch.color {
            self.color = color;
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

/// One entry of a reorder request.
#[derive(Clone, Debug, Deserialize)]
pub struct SkillOrder {
    pub id: String,
    pub order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> ApiResult<SkillPatch> {
        SkillPatch::from_payload(&Payload::from_value(value).unwrap())
    }

    #[test]
    fn test_new_skill_defaults() {
        let patch =
            patch(json!({"name": "Rust", "category": "backend", "proficiency": "85"})).unwrap();
        patch.check_required().unwrap();
        let skill = SkillRecord::from_patch(patch).unwrap();
        assert_eq!(skill.name, "Rust");
        assert_eq!(skill.proficiency, 85);
        assert_eq!(skill.color, DEFAULT_SKILL_COLOR);
        assert!(skill.is_visible);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        match patch(json!({"proficiency": 120, "color": "blue", "category": "design"})) {
            Err(ApiError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["proficiency", "color", "category"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
