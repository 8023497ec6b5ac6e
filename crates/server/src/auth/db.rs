use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use super::models::{Role, UserRecord};
use crate::media::MediaAsset;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, avatar, created_at, updated_at";

pub async fn fetch_user_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await
}

pub async fn admin_exists(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE role = ? LIMIT 1")
        .bind(Role::Admin)
        .fetch_optional(pool)
        .await?;
    Ok(exists.is_some())
}

pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<UserRecord, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, UserRecord>(&format!(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(cuid2::create_id())
    .bind(name)
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    email: &str,
    avatar: Option<&MediaAsset>,
) -> Result<UserRecord, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(&format!(
        "UPDATE users SET name = ?, email = ?, avatar = ?, updated_at = ? WHERE id = ? \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(name)
    .bind(email.trim().to_lowercase())
    .bind(avatar.map(Json))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn update_password(
    pool: &SqlitePool,
    id: &str,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_user_by_email(pool: &SqlitePool, email: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
