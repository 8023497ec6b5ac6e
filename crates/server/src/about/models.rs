use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::entries::{EducationEntry, ExperienceEntry};
use crate::errors::ApiResult;
use crate::media::MediaAsset;
use crate::validation::is_valid_email;
use crate::validation::payload::{Payload, Violations};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AboutRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub bio: String,
    pub short_bio: Option<String>,
    pub avatar: Option<Json<MediaAsset>>,
    pub resume: Option<Json<MediaAsset>>,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub social_links: Json<SocialLinks>,
    pub experience: Json<Vec<ExperienceEntry>>,
    pub education: Json<Vec<EducationEntry>>,
    pub years_of_experience: Option<i64>,
    pub projects_completed: Option<i64>,
    pub happy_clients: Option<i64>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct AboutPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<Option<String>>,
    pub bio: Option<String>,
    pub short_bio: Option<Option<String>>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub social_links: Option<SocialLinks>,
    pub experience: Option<Vec<ExperienceEntry>>,
    pub education: Option<Vec<EducationEntry>>,
    pub years_of_experience: Option<i64>,
    pub projects_completed: Option<i64>,
    pub happy_clients: Option<i64>,
    pub seo_title: Option<Option<String>>,
    pub seo_description: Option<Option<String>>,
    pub seo_keywords: Option<Vec<String>>,
}

fn counter(violations: &mut Violations, payload: &Payload, field: &str) -> Option<i64> {
    let value = violations.take(field, payload.integer(field), "Must be a whole number");
    if value.is_some_and(|n| n < 0) {
        violations.add(field, "Must be a whole number");
        return None;
    }
    value
}

impl AboutPatch {
    pub fn from_payload(payload: &Payload) -> ApiResult<Self> {
        let mut violations = Violations::new();

        let name = payload.text("name");
        if let Some(name) = &name {
            violations.check(!name.is_empty(), "name", "Name is required");
        }
        let title = payload.text("title");
        if let Some(title) = &title {
            violations.check(!title.is_empty(), "title", "Professional title is required");
        }
        let bio = payload.text("bio");
        if let Some(bio) = &bio {
            violations.length("bio", bio, 1, 2000, "Bio cannot exceed 2000 characters");
        }
        let short_bio = payload.clearable_text("shortBio");
        if let Some(Some(short_bio)) = &short_bio {
            violations.length(
                "shortBio",
                short_bio,
                0,
                300,
                "Short bio cannot exceed 300 characters",
            );
        }
        let email = payload.text("email").map(|email| email.to_lowercase());
        if let Some(email) = &email {
            violations.check(is_valid_email(email), "email", "Please enter a valid email");
        }

        let mut experience: Option<Vec<ExperienceEntry>> = violations.take(
            "experience",
            payload.json("experience"),
            "Experience must be a list of entries",
        );
        let mut education: Option<Vec<EducationEntry>> = violations.take(
            "education",
            payload.json("education"),
            "Education must be a list of entries",
        );
        for entry in experience.iter_mut().flatten() {
            entry.ensure_id();
        }
        for entry in education.iter_mut().flatten() {
            entry.ensure_id();
        }

        let patch = AboutPatch {
            name,
            title,
            subtitle: payload.clearable_text("subtitle"),
            bio,
            short_bio,
            email,
            phone: payload.clearable_text("phone"),
            location: payload.clearable_text("location"),
            social_links: violations.take(
                "socialLinks",
                payload.json("socialLinks"),
                "Social links must be an object",
            ),
            experience,
            education,
            years_of_experience: counter(&mut violations, payload, "yearsOfExperience"),
            projects_completed: counter(&mut violations, payload, "projectsCompleted"),
            happy_clients: counter(&mut violations, payload, "happyClients"),
            seo_title: payload.clearable_text("seoTitle"),
            seo_description: payload.clearable_text("seoDescription"),
            seo_keywords: payload.csv_list("seoKeywords"),
        };

        violations.finish()?;
        Ok(patch)
    }
}

impl AboutRecord {
    pub fn apply(&mut self, patch: AboutPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(subtitle) = patch.subtitle {
            self.subtitle = subtitle;
        }
        if let Some(bio) = patch.bio {
            self.bio = bio;
        }
        if let Some(short_bio) = patch.short_bio {
            self.short_bio = short_bio;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(social_links) = patch.social_links {
            self.social_links = Json(social_links);
        }
        if let Some(experience) = patch.experience {
            self.experience = Json(experience);
        }
        if let Some(education) = patch.education {
            self.education = Json(education);
        }
        if let Some(years) = patch.years_of_experience {
            self.years_of_experience = Some(years);
        }
        if let Some(projects) = patch.projects_completed {
            self.projects_completed = Some(projects);
        }
        if let Some(clients) = patch.happy_clients {
            self.happy_clients = Some(clients);
        }
        if let Some(seo_title) = patch.seo_title {
            self.seo_title = seo_title;
        }
        if let Some(seo_description) = patch.seo_description {
            self.seo_description = seo_description;
        }
        if let Some(keywords) = patch.seo_keywords {
            self.seo_keywords = Json(keywords);
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_fields_as_json_strings() {
        let payload = Payload::from_value(json!({
            "socialLinks": "{\"github\": \"https://github.com/jane\"}",
            "experience": "[{\"company\": \"Acme\", \"position\": \"Engineer\", \"current\": true}]",
            "seoKeywords": "rust, portfolio",
            "yearsOfExperience": "5",
        }))
        .unwrap();
        let patch = AboutPatch::from_payload(&payload).unwrap();

        assert_eq!(
            patch.social_links.unwrap().github.as_deref(),
            Some("https://github.com/jane")
        );
        let experience = patch.experience.unwrap();
        assert_eq!(experience[0].company.as_deref(), Some("Acme"));
        assert!(experience[0].current);
        assert!(!experience[0].id.is_empty());
        assert_eq!(
            patch.seo_keywords,
            Some(vec!["rust".to_string(), "portfolio".to_string()])
        );
        assert_eq!(patch.years_of_experience, Some(5));
    }

    #[test]
    fn test_rejects_bad_email_and_long_bio() {
        let payload = Payload::from_value(json!({
            "email": "nope",
            "bio": "x".repeat(2001),
        }))
        .unwrap();
        assert!(AboutPatch::from_payload(&payload).is_err());
    }
}
