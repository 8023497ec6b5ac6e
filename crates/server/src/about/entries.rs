//! Experience and education entries embedded in the profile.

use serde::{Deserialize, Serialize};

use super::models::AboutRecord;
use crate::errors::ApiResult;
use crate::validation::payload::{Payload, Violations};

/// A list entry the admin edits one at a time by its `_id`.
pub trait ProfileEntry: Sized + Send + Sync + 'static {
    /// Used in response messages, e.g. "Experience added successfully".
    const LABEL: &'static str;

    fn id(&self) -> &str;

    fn entries(about: &mut AboutRecord) -> &mut Vec<Self>;

    /// Overwrites the fields present in `payload`, leaving the rest.
    fn merge(&mut self, payload: &Payload) -> ApiResult<()>;

    fn from_payload(payload: &Payload) -> ApiResult<Self>;
}

fn new_entry_id() -> String {
    cuid2::create_id()
}

fn merge_text(slot: &mut Option<String>, payload: &Payload, key: &str) {
    if let Some(value) = payload.clearable_text(key) {
        *slot = value;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub current: bool,
}

impl ExperienceEntry {
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = new_entry_id();
        }
    }
}

impl ProfileEntry for ExperienceEntry {
    const LABEL: &'static str = "Experience";

    fn id(&self) -> &str {
        &self.id
    }

    fn entries(about: &mut AboutRecord) -> &mut Vec<Self> {
        &mut about.experience.0
    }

    fn merge(&mut self, payload: &Payload) -> ApiResult<()> {
        let mut violations = Violations::new();
        merge_text(&mut self.company, payload, "company");
        merge_text(&mut self.position, payload, "position");
        merge_text(&mut self.duration, payload, "duration");
        merge_text(&mut self.description, payload, "description");
        if let Some(current) =
            violations.take("current", payload.flag("current"), "Current must be a boolean")
        {
            self.current = current;
        }
        violations.finish()
    }

    fn from_payload(payload: &Payload) -> ApiResult<Self> {
        let mut entry = ExperienceEntry {
            id: new_entry_id(),
            ..Default::default()
        };
        entry.merge(payload)?;
        Ok(entry)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EducationEntry {
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = new_entry_id();
        }
    }
}

impl ProfileEntry for EducationEntry {
    const LABEL: &'static str = "Education";

    fn id(&self) -> &str {
        &self.id
    }

    fn entries(about: &mut AboutRecord) -> &mut Vec<Self> {
        &mut about.education.0
    }

    fn merge(&mut self, payload: &Payload) -> ApiResult<()> {
        merge_text(&mut self.institution, payload, "institution");
        merge_text(&mut self.degree, payload, "degree");
        merge_text(&mut self.field, payload, "field");
        merge_text(&mut self.duration, payload, "duration");
        merge_text(&mut self.description, payload, "description");
        Ok(())
    }

    fn from_payload(payload: &Payload) -> ApiResult<Self> {
        let mut entry = EducationEntry {
            id: new_entry_id(),
            ..Default::default()
        };
        entry.merge(payload)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_unsent_fields() {
        let mut entry = ExperienceEntry {
            id: "exp1".to_string(),
            company: Some("Acme".to_string()),
            position: Some("Engineer".to_string()),
            ..Default::default()
        };
        let payload = Payload::from_value(json!({"position": "Lead", "current": "true"})).unwrap();
        entry.merge(&payload).unwrap();

        assert_eq!(entry.id, "exp1");
        assert_eq!(entry.company.as_deref(), Some("Acme"));
        assert_eq!(entry.position.as_deref(), Some("Lead"));
        assert!(entry.current);
    }

    #[test]
    fn test_new_entries_get_ids() {
        let payload = Payload::from_value(json!({"institution": "MIT"})).unwrap();
        let first = EducationEntry::from_payload(&payload).unwrap();
        let second = EducationEntry::from_payload(&payload).unwrap();
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = EducationEntry {
            id: "edu1".to_string(),
            degree: Some("BSc".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"_id": "edu1", "degree": "BSc"})
        );
    }
}
