use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::auth::accounts::hash_blocking;
use crate::auth::{AuthSettings, Role, UserRecord, db as user_db};
use crate::config::Environment;
use crate::media::{MediaAsset, MediaFolder, MediaStore, UploadedFile};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "password123";

/// Creates an in-memory SQLite pool for testing
pub async fn create_test_pool() -> Result<SqlitePool> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // In-memory databases should use a single connection
        .connect_with(connect_options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(Default)]
struct MemoryMediaInner {
    stored: Vec<String>,
    deleted: Vec<String>,
    uploads: usize,
    fail_after: Option<usize>,
}

/// Media store that keeps public ids in memory.
#[derive(Default)]
pub struct MemoryMediaStore {
    inner: Mutex<MemoryMediaInner>,
}

impl MemoryMediaStore {
    fn lock(&self) -> MutexGuard<'_, MemoryMediaInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Let `count` more uploads succeed, then fail every later one.
    pub fn fail_uploads_after(&self, count: usize) {
        let mut inner = self.lock();
        inner.fail_after = Some(inner.uploads + count);
    }

    /// Assets uploaded and not yet deleted.
    pub fn stored_ids(&self) -> Vec<String> {
        self.lock().stored.clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, file: &UploadedFile, folder: MediaFolder) -> Result<MediaAsset> {
        let mut inner = self.lock();
        if inner.fail_after.is_some_and(|limit| inner.uploads >= limit) {
            return Err(anyhow!("upload rejected by test store"));
        }
        inner.uploads += 1;

        let ext = file.extension().unwrap_or_else(|| "bin".to_string());
        let public_id = format!("{}/{}.{ext}", folder.as_str(), cuid2::create_id());
        inner.stored.push(public_id.clone());
        Ok(MediaAsset {
            url: format!("https://media.test/{public_id}"),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.stored.retain(|id| id != public_id);
        inner.deleted.push(public_id.to_string());
        Ok(())
    }
}

/// A small PNG upload sent under `field`.
pub fn image_file(field: &str) -> UploadedFile {
    UploadedFile {
        field: field.to_string(),
        file_name: format!("{field}.png"),
        content_type: "image/png".to_string(),
        bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
    }
}

pub fn pdf_file(field: &str) -> UploadedFile {
    UploadedFile {
        field: field.to_string(),
        file_name: format!("{field}.pdf"),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.4\n%%EOF\n"),
    }
}

pub fn test_auth_settings() -> AuthSettings {
    AuthSettings::new(TEST_JWT_SECRET, 7, "token", false)
}

/// An [`AppState`] over an in-memory database and media store.
pub async fn create_test_state() -> Result<(AppState, Arc<MemoryMediaStore>)> {
    let pool = create_test_pool().await?;
    let media = Arc::new(MemoryMediaStore::default());
    let state = AppState::new(
        pool,
        media.clone(),
        test_auth_settings(),
        Environment::Development,
    );
    Ok((state, media))
}

/// Inserts a user whose password is [`TEST_PASSWORD`].
pub async fn create_test_user(
    pool: &SqlitePool,
    email: &str,
    role: Role,
) -> Result<UserRecord> {
    let password_hash = hash_blocking(TEST_PASSWORD.to_string()).await?;
    let user = user_db::insert_user(pool, "Test User", email, &password_hash, role).await?;
    Ok(user)
}

/// Inserts an admin and returns a bearer token for it.
pub async fn create_admin_token(state: &AppState) -> Result<String> {
    let admin = create_test_user(&state.pool, "admin@example.com", Role::Admin).await?;
    state.auth.issue(&admin.id)
}
