//! Project fields as accepted from the admin UI.

use chrono::NaiveDate;

use super::models::{ProjectCategory, ProjectStatus};
use crate::errors::ApiResult;
use crate::media::MediaAsset;
use crate::validation::payload::{Payload, Violations, link_field, order_field};

/// The fields present in a create or update request. Nested options
/// distinguish "leave unchanged" (`None`) from "clear" (`Some(None)`).
#[derive(Clone, Debug, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<Option<String>>,
    pub thumbnail: Option<MediaAsset>,
    pub technologies: Option<Vec<String>>,
    pub category: Option<ProjectCategory>,
    pub live_url: Option<Option<String>>,
    pub github_url: Option<Option<String>>,
    pub featured: Option<bool>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub order: Option<i64>,
    pub is_visible: Option<bool>,
}

impl ProjectPatch {
    pub fn from_payload(payload: &Payload) -> ApiResult<Self> {
        let mut violations = Violations::new();

        let title = payload.text("title");
        if let Some(title) = &title {
            violations.length("title", title, 3, 100, "Title must be between 3 and 100 characters");
        }
        let description = payload.text("description");
        if let Some(description) = &description {
            violations.length(
                "description",
                description,
                10,
                500,
                "Description must be between 10 and 500 characters",
            );
        }
        let long_description = payload.clearable_text("longDescription");
        if let Some(Some(text)) = &long_description {
            violations.length(
                "longDescription",
                text,
                0,
                2000,
                "Long description cannot exceed 2000 characters",
            );
        }

        let thumbnail = violations.take(
            "thumbnail",
            payload.json::<MediaAsset>("thumbnail"),
            "Thumbnail must be an object with a url",
        );
        if let Some(thumbnail) = &thumbnail {
            violations.check(
                !thumbnail.url.trim().is_empty(),
                "thumbnail",
                "Thumbnail is required",
            );
        }

        let live_url = link_field(&mut violations, payload, "liveUrl", "Please enter a valid URL");
        let github_url = link_field(
            &mut violations,
            payload,
            "githubUrl",
            "Please enter a valid GitHub URL",
        );

        let patch = ProjectPatch {
            title,
            description,
            long_description,
            thumbnail,
            technologies: payload.csv_list("technologies"),
            category: violations.take(
                "category",
                payload.choice("category"),
                "Invalid category",
            ),
            live_url,
            github_url,
            featured: violations.take(
                "featured",
                payload.flag("featured"),
                "Featured must be a boolean",
            ),
            status: violations.take(
                "status",
                payload.choice("status"),
                "Invalid status",
            ),
            start_date: violations.take(
                "startDate",
                payload.date("startDate"),
                "Start date must be a valid date",
            ),
            end_date: violations.take(
                "endDate",
                payload.date("endDate"),
                "End date must be a valid date",
            ),
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

    /// Checks the fields a new project cannot do without.
    pub fn check_required(&self) -> ApiResult<()> {
        let mut violations = Violations::new();
        violations.check(self.title.is_some(), "title", "Title is required");
        violations.check(
            self.description.is_some(),
            "description",
            "Description is required",
        );
        violations.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> ApiResult<ProjectPatch> {
        ProjectPatch::from_payload(&Payload::from_value(value).unwrap())
    }

    fn failed_fields(result: ApiResult<ProjectPatch>) -> Vec<String> {
        match result {
            Err(ApiError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_multipart_shaped_fields() {
        let patch = patch(json!({
            "title": "Weather Dashboard",
            "description": "Forecasts for any city",
            "technologies": "React, Chart.js , ",
            "featured": "true",
            "order": "2",
            "status": "in-progress",
            "startDate": "2024-03-01",
            "liveUrl": "",
        }))
        .unwrap();

        assert_eq!(patch.technologies, Some(vec!["React".to_string(), "Chart.js".to_string()]));
        assert_eq!(patch.featured, Some(true));
        assert_eq!(patch.order, Some(2));
        assert_eq!(patch.status, Some(ProjectStatus::InProgress));
        assert_eq!(
            patch.start_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 1))
        );
        assert_eq!(patch.live_url, Some(None));
        assert_eq!(patch.github_url, None);
        assert!(patch.check_required().is_ok());
    }

    #[test]
    fn test_json_thumbnail() {
        let patch = patch(json!({
            "thumbnail": {"url": "https://images.example.com/p.png"},
        }))
        .unwrap();
        let thumbnail = patch.thumbnail.unwrap();
        assert_eq!(thumbnail.url, "https://images.example.com/p.png");
        assert_eq!(thumbnail.public_id, "");
    }

    #[test]
    fn test_rejects_bad_values() {
        let fields = failed_fields(patch(json!({
            "title": "ab",
            "category": "games",
            "order": -1,
            "githubUrl": "not a url",
            "endDate": "yesterday",
        })));
        assert_eq!(fields, vec!["title", "githubUrl", "category", "endDate", "order"]);
    }

    #[test]
    fn test_required_fields_for_create() {
        let patch = patch(json!({"featured": false})).unwrap();
        match patch.check_required() {
            Err(ApiError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
