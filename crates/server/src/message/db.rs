use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{MessageCounts, MessageRecord, MessageStatus};

const MESSAGE_COLUMNS: &str = "id, name, email, subject, message, status, is_starred, \
     replied_at, ip_address, user_agent, created_at, updated_at";

#[derive(Clone, Debug, Default)]
pub struct MessageFilter {
    pub status: Option<MessageStatus>,
    pub starred: bool,
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &MessageFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if filter.starred {
        builder.push(" AND is_starred = 1");
    }
}

fn push_ids<'a>(builder: &mut QueryBuilder<'a, Sqlite>, ids: &'a [String]) {
    builder.push(" id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");
}

pub async fn insert_message(
    pool: &SqlitePool,
    message: &MessageRecord,
) -> Result<MessageRecord, sqlx::Error> {
    sqlx::query_as::<_, MessageRecord>(&format!(
        "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(&message.id)
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.subject)
    .bind(&message.message)
    .bind(message.status)
    .bind(message.is_starred)
    .bind(message.replied_at)
    .bind(&message.ip_address)
    .bind(&message.user_agent)
    .bind(message.created_at)
    .bind(message.updated_at)
    .fetch_one(pool)
    .await
}

/// `order_clause` must come from [`crate::api::query::order_by`].
pub async fn list_messages(
    pool: &SqlitePool,
    filter: &MessageFilter,
    order_clause: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<MessageRecord>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages"));
    push_filters(&mut builder, filter);
    builder
        .push(format!(" ORDER BY {order_clause}, id"))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder.build_query_as::<MessageRecord>().fetch_all(pool).await
}

pub async fn count_messages(pool: &SqlitePool, filter: &MessageFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM messages");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Inbox totals by status, independent of any listing filter.
pub async fn message_counts(pool: &SqlitePool) -> Result<MessageCounts, sqlx::Error> {
    sqlx::query_as::<_, MessageCounts>(
        "SELECT COUNT(*) AS \"all\", \
         COALESCE(SUM(status = 'unread'), 0) AS unread, \
         COALESCE(SUM(status = 'read'), 0) AS read, \
         COALESCE(SUM(status = 'replied'), 0) AS replied, \
         COALESCE(SUM(status = 'archived'), 0) AS archived, \
         COALESCE(SUM(is_starred), 0) AS starred \
         FROM messages",
    )
    .fetch_one(pool)
    .await
}

pub async fn fetch_message(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<MessageRecord>, sqlx::Error> {
    sqlx::query_as::<_, MessageRecord>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fetches a message for reading, moving it from unread to read.
pub async fn open_message(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<MessageRecord>, sqlx::Error> {
    let opened = sqlx::query_as::<_, MessageRecord>(&format!(
        "UPDATE messages SET status = 'read', updated_at = ? WHERE id = ? AND status = 'unread' \
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match opened {
        Some(message) => Ok(Some(message)),
        None => fetch_message(pool, id).await,
    }
}

/// Sets the status; moving to `replied` also stamps `replied_at`.
pub async fn set_status(
    pool: &SqlitePool,
    id: &str,
    status: MessageStatus,
) -> Result<Option<MessageRecord>, sqlx::Error> {
    let now = Utc::now();
    let replied_at = (status == MessageStatus::Replied).then_some(now);
    sqlx::query_as::<_, MessageRecord>(&format!(
        "UPDATE messages SET status = ?, replied_at = COALESCE(?, replied_at), updated_at = ? \
         WHERE id = ? RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(status)
    .bind(replied_at)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn toggle_star(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<MessageRecord>, sqlx::Error> {
    sqlx::query_as::<_, MessageRecord>(&format!(
        "UPDATE messages SET is_starred = NOT is_starred, updated_at = ? WHERE id = ? \
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_message(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_messages(pool: &SqlitePool, ids: &[String]) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::new("DELETE FROM messages WHERE");
    push_ids(&mut builder, ids);
    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Marks the unread messages among `ids` as read; others keep their status.
pub async fn mark_read(pool: &SqlitePool, ids: &[String]) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE messages SET status = 'read', updated_at = ");
    builder.push_bind(Utc::now()).push(" WHERE status = 'unread' AND");
    push_ids(&mut builder, ids);
    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<MessageRecord>, sqlx::Error> {
    sqlx::query_as::<_, MessageRecord>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC, id LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Creation times of messages received at or after `since`.
pub async fn received_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM messages WHERE created_at >= ? ORDER BY created_at",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}
