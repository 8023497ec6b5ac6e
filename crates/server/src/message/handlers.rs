use std::net::SocketAddr;

use axum::Router;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::routing::{get, patch};
use serde::Deserialize;

use super::db::{self, MessageFilter};
use super::models::{
    MESSAGE_SORT_COLUMNS, MessageInbox, MessageReceipt, MessageRecord, MessageStatus, Origin,
};
use crate::api::form::FormData;
use crate::api::query::{order_by, page_window};
use crate::api::response::{Pagination, Reply};
use crate::auth::AdminUser;
use crate::errors::{ApiError, ApiResult, FieldError, bad_request, not_found};
use crate::state::AppState;
use crate::validation::payload::variant;

const DEFAULT_PAGE_SIZE: i64 = 20;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_messages).post(create_message).delete(delete_messages),
        )
        .route("/mark-read", patch(mark_read))
        .route("/{id}", get(message_by_id).delete(delete_message))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/star", patch(toggle_star))
}

fn message_not_found() -> ApiError {
    not_found("Message not found")
}

fn status_error(message: &str) -> ApiError {
    ApiError::Validation(vec![FieldError::new("status", message)])
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
}

/// The first `X-Forwarded-For` hop, else the peer address when the server
/// was started with connect info.
impl<S: Send + Sync> FromRequestParts<S> for Origin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        let ip_address = forwarded_for(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(Origin {
            ip_address,
            user_agent,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageListParams {
    pub status: Option<String>,
    pub starred: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

impl MessageListParams {
    fn filter(&self) -> ApiResult<MessageFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(
                variant::<MessageStatus>(raw)
                    .ok_or_else(|| bad_request("Invalid status filter"))?,
            ),
        };
        Ok(MessageFilter {
            status,
            starred: self.starred.as_deref() == Some("true"),
        })
    }
}

async fn create_message(
    State(state): State<AppState>,
    origin: Origin,
    form: FormData,
) -> ApiResult<Reply<MessageReceipt>> {
    let message = MessageRecord::from_payload(&form.payload, origin)?;
    let saved = db::insert_message(&state.pool, &message).await?;
    metrics::counter!("messages.received").increment(1);
    tracing::info!(id = %saved.id, "contact message received");

    Ok(Reply::created(
        MessageReceipt { id: saved.id },
        "Message sent successfully! I will get back to you soon.",
    ))
}

async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<MessageListParams>,
) -> ApiResult<Reply<MessageInbox>> {
    let filter = params.filter()?;
    let (page, limit) =
        page_window(params.page.as_deref(), params.limit.as_deref(), DEFAULT_PAGE_SIZE)?;
    let order = order_by(params.sort.as_deref(), "-createdAt", MESSAGE_SORT_COLUMNS)?;

    let counts = db::message_counts(&state.pool).await?;
    let total = db::count_messages(&state.pool, &filter).await?;
    let pagination = Pagination::new(page, limit, total);
    let messages =
        db::list_messages(&state.pool, &filter, &order, limit, pagination.offset()).await?;

    Ok(Reply::ok(
        MessageInbox {
            messages,
            counts,
            pagination,
        },
        "Messages retrieved successfully",
    ))
}

async fn message_by_id(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<MessageRecord>> {
    let message = db::open_message(&state.pool, &id)
        .await?
        .ok_or_else(message_not_found)?;
    Ok(Reply::ok(message, "Message retrieved successfully"))
}

async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    form: FormData,
) -> ApiResult<Reply<MessageRecord>> {
    let status = match form.payload.choice::<MessageStatus>("status") {
        Ok(Some(status)) => status,
        Ok(None) => return Err(status_error("Status is required")),
        Err(_) => return Err(status_error("Invalid status")),
    };

    let message = db::set_status(&state.pool, &id, status)
        .await?
        .ok_or_else(message_not_found)?;
    Ok(Reply::ok(message, "Message status updated successfully"))
}

async fn toggle_star(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<MessageRecord>> {
    let message = db::toggle_star(&state.pool, &id)
        .await?
        .ok_or_else(message_not_found)?;
    let verb = if message.is_starred { "starred" } else { "unstarred" };
    Ok(Reply::ok(message, format!("Message {verb} successfully")))
}

async fn delete_message(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    if db::delete_message(&state.pool, &id).await? == 0 {
        return Err(message_not_found());
    }
    Ok(Reply::ok((), "Message deleted successfully"))
}

async fn delete_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<()>> {
    let ids = form.payload.ids("ids");
    if ids.is_empty() {
        return Err(bad_request("Please provide message IDs to delete"));
    }
    let deleted = db::delete_messages(&state.pool, &ids).await?;
    tracing::info!(requested = ids.len(), deleted, "bulk message delete");
    Ok(Reply::ok((), format!("{deleted} messages deleted successfully")))
}

async fn mark_read(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<()>> {
    let ids = form.payload.ids("ids");
    if ids.is_empty() {
        return Err(bad_request("Please provide message IDs"));
    }
    db::mark_read(&state.pool, &ids).await?;
    Ok(Reply::ok((), "Messages marked as read successfully"))
}
