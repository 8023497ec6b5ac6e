use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::Pagination;
use crate::errors::ApiResult;
use crate::validation::is_valid_email;
use crate::validation::payload::{Payload, Violations};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
    Replied,
    Archived,
}

pub const MESSAGE_SORT_COLUMNS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("name", "name"),
    ("subject", "subject"),
    ("status", "status"),
    ("isStarred", "is_starred"),
];

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: MessageStatus,
    pub is_starred: bool,
    pub replied_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a submission came from.
#[derive(Clone, Debug, Default)]
pub struct Origin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl MessageRecord {
    pub fn from_payload(payload: &Payload, origin: Origin) -> ApiResult<Self> {
        let mut violations = Violations::new();

        let name = violations.require("name", payload.non_empty_text("name"), "Name is required");
        if let Some(name) = &name {
            violations.length("name", name, 2, 100, "Name must be between 2 and 100 characters");
        }
        let email = violations
            .require("email", payload.non_empty_text("email"), "Email is required")
            .map(|email| email.to_lowercase());
        if let Some(email) = &email {
            violations.check(is_valid_email(email), "email", "Please enter a valid email");
        }
        let subject =
            violations.require("subject", payload.non_empty_text("subject"), "Subject is required");
        if let Some(subject) = &subject {
            violations.length(
                "subject",
                subject,
                3,
                200,
                "Subject must be between 3 and 200 characters",
            );
        }
        let message =
            violations.require("message", payload.non_empty_text("message"), "Message is required");
        if let Some(message) = &message {
            violations.length(
                "message",
                message,
                10,
                2000,
                "Message must be between 10 and 2000 characters",
            );
        }

        violations.finish()?;
        let now = Utc::now();
        Ok(MessageRecord {
            id: cuid2::create_id(),
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            subject: subject.unwrap_or_default(),
            message: message.unwrap_or_default(),
            status: MessageStatus::Unread,
            is_starred: false,
            replied_at: None,
            ip_address: origin.ip_address,
            user_agent: origin.user_agent,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MessageCounts {
    pub all: i64,
    pub unread: i64,
    pub read: i64,
    pub replied: i64,
    pub archived: i64,
    pub starred: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageInbox {
    pub messages: Vec<MessageRecord>,
    pub counts: MessageCounts,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct MessageReceipt {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use serde_json::json;

    #[test]
    fn test_valid_submission() {
        let payload = Payload::from_value(json!({
            "name": "  Jane  ",
            "email": "Jane@Example.COM",
            "subject": "Project inquiry",
            "message": "I would like to talk about a project.",
        }))
        .unwrap();
        let origin = Origin {
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: None,
        };
        let message = MessageRecord::from_payload(&payload, origin).unwrap();

        assert_eq!(message.name, "Jane");
        assert_eq!(message.email, "jane@example.com");
        assert_eq!(message.status, MessageStatus::Unread);
        assert_eq!(message.ip_address.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_every_field_is_checked() {
        let payload = Payload::from_value(json!({
            "name": "J",
            "email": "not-an-email",
            "subject": "hi",
            "message": "short",
        }))
        .unwrap();
        let Err(ApiError::Validation(errors)) =
            MessageRecord::from_payload(&payload, Origin::default())
        else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "subject", "message"]);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(
            crate::validation::payload::variant::<MessageStatus>("replied"),
            Some(MessageStatus::Replied)
        );
        assert_eq!(
            crate::validation::payload::variant::<MessageStatus>("spam"),
            None
        );
    }
}
