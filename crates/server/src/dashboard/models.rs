use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::types::Json;

use crate::media::MediaAsset;
use crate::message::models::MessageStatus;
use crate::project::models::ProjectCategory;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_projects: i64,
    pub featured_projects: i64,
    pub total_skills: i64,
    pub total_messages: i64,
    pub unread_messages: i64,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    #[serde(rename = "_id")]
    pub category: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategoryStats {
    #[serde(rename = "_id")]
    pub category: String,
    pub count: i64,
    pub avg_proficiency: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    #[serde(rename = "_id")]
    pub period: YearMonth,
    pub count: i64,
}

/// Buckets timestamps by calendar month (UTC), oldest month first.
pub fn count_by_month(timestamps: &[DateTime<Utc>]) -> Vec<MonthCount> {
    let mut buckets: BTreeMap<YearMonth, i64> = BTreeMap::new();
    for ts in timestamps {
        let period = YearMonth {
            year: ts.year(),
            month: ts.month(),
        };
        *buckets.entry(period).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(period, count)| MonthCount { period, count })
        .collect()
}

#[derive(Clone, Debug, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub title: String,
    pub email: String,
    pub avatar: Option<Json<MediaAsset>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub overview: Overview,
    pub recent_messages: Vec<RecentMessage>,
    pub projects_by_category: Vec<CategoryCount>,
    pub skills_by_category: Vec<SkillCategoryStats>,
    pub messages_by_month: Vec<MonthCount>,
    pub profile: ProfileSummary,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ProjectActivityRow {
    pub title: String,
    pub category: ProjectCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MessageActivityRow {
    pub name: String,
    pub subject: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Project {
        title: String,
        category: ProjectCategory,
        date: DateTime<Utc>,
    },
    Message {
        title: String,
        subject: String,
        status: MessageStatus,
        date: DateTime<Utc>,
    },
}

impl Activity {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Activity::Project { date, .. } | Activity::Message { date, .. } => *date,
        }
    }
}

impl From<ProjectActivityRow> for Activity {
    fn from(row: ProjectActivityRow) -> Self {
        Activity::Project {
            title: format!("New project: {}", row.title),
            category: row.category,
            date: row.created_at,
        }
    }
}

impl From<MessageActivityRow> for Activity {
    fn from(row: MessageActivityRow) -> Self {
        Activity::Message {
            title: format!("Message from {}", row.name),
            subject: row.subject,
            status: row.status,
            date: row.created_at,
        }
    }
}

/// Interleaves both feeds newest first and keeps at most `limit` entries.
pub fn merge_activity(
    projects: Vec<ProjectActivityRow>,
    messages: Vec<MessageActivityRow>,
    limit: usize,
) -> Vec<Activity> {
    let mut feed: Vec<Activity> = projects
        .into_iter()
        .map(Activity::from)
        .chain(messages.into_iter().map(Activity::from))
        .collect();
    feed.sort_by(|a, b| b.date().cmp(&a.date()));
    feed.truncate(limit);
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_count_by_month() {
        let counts = count_by_month(&[at(2024, 12, 3), at(2025, 1, 9), at(2024, 12, 30)]);
        assert_eq!(
            serde_json::to_value(&counts).unwrap(),
            json!([
                {"_id": {"year": 2024, "month": 12}, "count": 2},
                {"_id": {"year": 2025, "month": 1}, "count": 1},
            ])
        );
    }

    #[test]
    fn test_merge_activity_newest_first() {
        let projects = vec![ProjectActivityRow {
            title: "Site".to_string(),
            category: ProjectCategory::Web,
            created_at: at(2025, 1, 2),
        }];
        let messages = vec![
            MessageActivityRow {
                name: "Ann".to_string(),
                subject: "Hi".to_string(),
                status: MessageStatus::Unread,
                created_at: at(2025, 1, 3),
            },
            MessageActivityRow {
                name: "Bob".to_string(),
                subject: "Hey".to_string(),
                status: MessageStatus::Read,
                created_at: at(2025, 1, 1),
            },
        ];

        let feed = merge_activity(projects, messages, 2);
        assert_eq!(feed.len(), 2);
        let value = serde_json::to_value(&feed).unwrap();
        assert_eq!(value[0]["type"], "message");
        assert_eq!(value[0]["title"], "Message from Ann");
        assert_eq!(value[1]["type"], "project");
        assert_eq!(value[1]["title"], "New project: Site");
        assert_eq!(value[1]["category"], "web");
    }
}
