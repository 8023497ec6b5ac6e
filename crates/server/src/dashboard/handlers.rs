use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use chrono::{Months, Utc};
use serde::Deserialize;

use super::db;
use super::models::{Activity, DashboardStats, ProfileSummary, count_by_month, merge_activity};
use crate::about::db::get_or_create_default;
use crate::api::query::page_window;
use crate::api::response::Reply;
use crate::auth::AdminUser;
use crate::errors::ApiResult;
use crate::message::db as message_db;
use crate::state::AppState;

const RECENT_MESSAGES: i64 = 5;
const MONTHS_OF_HISTORY: u32 = 6;
const DEFAULT_ACTIVITY_LIMIT: i64 = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/activity", get(activity))
}

async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Reply<DashboardStats>> {
    let pool = &state.pool;
    let now = Utc::now();
    let since = now
        .checked_sub_months(Months::new(MONTHS_OF_HISTORY))
        .unwrap_or(now);

    let (overview, recent_messages, projects_by_category, skills_by_category, message_times) =
        tokio::try_join!(
            db::overview(pool),
            db::recent_messages(pool, RECENT_MESSAGES),
            db::projects_by_category(pool),
            db::skills_by_category(pool),
            message_db::received_since(pool, since),
        )?;
    let about = get_or_create_default(pool).await?;

    Ok(Reply::ok(
        DashboardStats {
            overview,
            recent_messages,
            projects_by_category,
            skills_by_category,
            messages_by_month: count_by_month(&message_times),
            profile: ProfileSummary {
                name: about.name,
                title: about.title,
                email: about.email,
                avatar: about.avatar,
            },
        },
        "Dashboard stats retrieved successfully",
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<String>,
}

async fn activity(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ActivityParams>,
) -> ApiResult<Reply<Vec<Activity>>> {
    let (_, limit) = page_window(None, params.limit.as_deref(), DEFAULT_ACTIVITY_LIMIT)?;
    let (projects, messages) = tokio::try_join!(
        db::recent_projects(&state.pool, limit),
        db::recent_message_activity(&state.pool, limit),
    )?;

    let feed = merge_activity(projects, messages, limit as usize);
    Ok(Reply::ok(feed, "Recent activity retrieved successfully"))
}
