//! Account operations shared by the HTTP handlers, startup and the CLI.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::db;
use super::models::{Role, UserRecord};
use super::password::{hash_password, verify_password};
use crate::config::AdminCredentials;

/// PBKDF2 on the blocking pool.
pub async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")?
}

pub async fn verify_blocking(password: String, encoded: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .context("password check task failed")
}

/// Look up a user by email and check the password. `None` covers both an
/// unknown email and a wrong password.
pub async fn authenticate(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<UserRecord>> {
    let Some(user) = db::fetch_user_by_email(pool, email).await? else {
        return Ok(None);
    };
    let matches = verify_blocking(password.to_string(), user.password_hash.clone()).await?;
    Ok(matches.then_some(user))
}

/// Create the admin account unless a user with that email already exists.
/// Returns whether an account was created.
pub async fn ensure_admin(pool: &SqlitePool, admin: &AdminCredentials) -> Result<bool> {
    if db::fetch_user_by_email(pool, &admin.email).await?.is_some() {
        return Ok(false);
    }

    let password_hash = hash_blocking(admin.password.clone()).await?;
    db::insert_user(pool, &admin.name, &admin.email, &password_hash, Role::Admin).await?;
    tracing::info!(email = %admin.email, "admin account created");
    Ok(true)
}

/// Delete any account with the admin email and create it afresh.
pub async fn reset_admin(pool: &SqlitePool, admin: &AdminCredentials) -> Result<UserRecord> {
    let deleted = db::delete_user_by_email(pool, &admin.email).await?;
    if deleted > 0 {
        tracing::info!(email = %admin.email, "previous admin account deleted");
    }

    let password_hash = hash_blocking(admin.password.clone()).await?;
    let user =
        db::insert_user(pool, &admin.name, &admin.email, &password_hash, Role::Admin).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_pool;

    fn admin() -> AdminCredentials {
        AdminCredentials {
            name: "Admin User".to_string(),
            email: "admin@example.com".to_string(),
            password: "changeme".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let pool = create_test_pool().await.unwrap();

        assert!(ensure_admin(&pool, &admin()).await.unwrap());
        assert!(!ensure_admin(&pool, &admin()).await.unwrap());
        assert!(db::admin_exists(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let pool = create_test_pool().await.unwrap();
        ensure_admin(&pool, &admin()).await.unwrap();

        let user = authenticate(&pool, "ADMIN@example.com", "changeme")
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_admin());

        assert!(authenticate(&pool, "admin@example.com", "wrong").await.unwrap().is_none());
        assert!(authenticate(&pool, "nobody@example.com", "changeme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_admin_replaces_password() {
        let pool = create_test_pool().await.unwrap();
        ensure_admin(&pool, &admin()).await.unwrap();

        let mut creds = admin();
        creds.password = "new-password".to_string();
        let user = reset_admin(&pool, &creds).await.unwrap();
        assert_eq!(user.email, "admin@example.com");

        assert!(authenticate(&pool, "admin@example.com", "changeme").await.unwrap().is_none());
        assert!(authenticate(&pool, "admin@example.com", "new-password").await.unwrap().is_some());
    }
}
