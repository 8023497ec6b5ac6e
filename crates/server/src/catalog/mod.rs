//! Write path shared by the slugged collections (projects and sale
//! projects).
//!
//! The probe in [`assign_slug`] only observes a free slug at one instant; the
//! unique index on `slug` is what actually rejects a duplicate. A rejected
//! insert is treated as a lost race and the whole assign-then-persist cycle
//! runs again, up to [`MAX_SLUG_ATTEMPTS`] times.

use std::future::Future;

use metrics::counter;
use sqlx::SqlitePool;

use crate::api::form::FormData;
use crate::db::is_unique_violation;
use crate::errors::{ApiError, ApiResult};
use crate::media::{self, MediaAsset, MediaFolder, MediaStore};
use crate::validation::slug::assign_slug;

pub const MAX_SLUG_ATTEMPTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogKind {
    Projects,
    SaleProjects,
}

impl CatalogKind {
    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::Projects => "projects",
            CatalogKind::SaleProjects => "sale_projects",
        }
    }
}

pub async fn slug_exists(
    pool: &SqlitePool,
    kind: CatalogKind,
    slug: String,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT 1 FROM {} WHERE slug = ? LIMIT 1",
        kind.table()
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

/// Derive a free slug for `title` and hand it to `insert`, retrying when the
/// insert loses a race for the slug.
pub async fn insert_with_unique_slug<T, F, Fut>(
    pool: &SqlitePool,
    kind: CatalogKind,
    title: &str,
    mut insert: F,
) -> ApiResult<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let table = kind.table();

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let mut probes: u64 = 0;
        let slug = assign_slug(title, |candidate| {
            probes += 1;
            slug_exists(pool, kind, candidate)
        })
        .await?;
        counter!("catalog.slug_probes", "collection" => table).increment(probes);

        match insert(slug.clone()).await {
            Ok(row) => return Ok(row),
            Err(err) if is_unique_violation(&err) => {
                counter!("catalog.slug_conflicts", "collection" => table).increment(1);
                tracing::warn!(
                    collection = table,
                    attempt,
                    "slug {slug} was taken before insert, retrying"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::error!(collection = table, "giving up on slug for {title:?}");
    Err(ApiError::Conflict("Slug already exists".to_string()))
}

/// Thumbnail and gallery uploads for one catalog write, stored but not yet
/// referenced by any row.
#[derive(Debug, Default)]
pub struct StagedMedia {
    pub thumbnail: Option<MediaAsset>,
    /// `Some` only when new gallery images were sent; they replace the old set.
    pub images: Option<Vec<MediaAsset>>,
}

impl StagedMedia {
    /// Validate and upload the `thumbnail` and `images` files of `form`.
    /// Nothing is left stored when any upload fails.
    pub async fn upload(
        store: &dyn MediaStore,
        form: &mut FormData,
        folder: MediaFolder,
    ) -> ApiResult<Self> {
        let thumbnail_file = form.take_file("thumbnail");
        let image_files = form.take_files("images");
        if let Some(file) = &thumbnail_file {
            media::check_image(file)?;
        }
        media::check_images(&image_files)?;

        let thumbnail = match &thumbnail_file {
            Some(file) => Some(media::upload(store, file, folder).await?),
            None => None,
        };

        let images = if image_files.is_empty() {
            None
        } else {
            match media::upload_all(store, &image_files, folder).await {
                Ok(images) => Some(images),
                Err(err) => {
                    media::discard(store, thumbnail.iter()).await;
                    return Err(err.into());
                }
            }
        };

        Ok(Self { thumbnail, images })
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnail.is_none() && self.images.is_none()
    }

    /// Remove everything staged; used when the row write fails.
    pub async fn rollback(self, store: &dyn MediaStore) {
        media::discard(store, self.thumbnail.iter()).await;
        media::discard(store, self.images.iter().flatten()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemoryMediaStore, create_test_pool, image_file};
    use crate::validation::payload::Payload;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn insert_project(
        pool: &SqlitePool,
        title: &str,
        slug: &str,
    ) -> Result<String, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO projects (id, title, slug, description, thumbnail, created_at, updated_at) \
             VALUES (?, ?, ?, 'A sample project', '{\"url\":\"https://example.com/a.png\"}', ?, ?)",
        )
        .bind(cuid2::create_id())
        .bind(title)
        .bind(slug)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(slug.to_string())
    }

    #[tokio::test]
    async fn test_repeated_titles_get_suffixes() {
        let pool = create_test_pool().await.unwrap();

        let mut slugs = Vec::new();
        for _ in 0..3 {
            let slug =
                insert_with_unique_slug(&pool, CatalogKind::Projects, "Portfolio Website", |slug| {
                    let pool = pool.clone();
                    async move { insert_project(&pool, "Portfolio Website", &slug).await }
                })
                .await
                .unwrap();
            slugs.push(slug);
        }

        assert_eq!(
            slugs,
            vec!["portfolio-website", "portfolio-website-1", "portfolio-website-2"]
        );
    }

    #[tokio::test]
    async fn test_lost_race_retries_with_next_slug() {
        let pool = create_test_pool().await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let slug = insert_with_unique_slug(&pool, CatalogKind::Projects, "My Title!!", |slug| {
            let pool = pool.clone();
            let calls = calls.clone();
            async move {
                // A concurrent writer claims the slug between probe and insert.
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    insert_project(&pool, "Racer", &slug).await?;
                }
                insert_project(&pool, "My Title!!", &slug).await
            }
        })
        .await
        .unwrap();

        assert_eq!(slug, "my-title-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_repeated_conflicts() {
        let pool = create_test_pool().await.unwrap();
        insert_project(&pool, "Taken", "taken").await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = insert_with_unique_slug(&pool, CatalogKind::Projects, "Shop", |_slug| {
            let pool = pool.clone();
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                insert_project(&pool, "Shop", "taken").await
            }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_SLUG_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let pool = create_test_pool().await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let result: ApiResult<()> =
            insert_with_unique_slug(&pool, CatalogKind::Projects, "Anything", |_slug| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(sqlx::Error::RowNotFound)
                }
            })
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_staged_media_uploads_and_supersedes() {
        let store = MemoryMediaStore::default();
        let mut form = FormData::new(
            Payload::default(),
            vec![image_file("thumbnail"), image_file("images"), image_file("images")],
        );

        let staged = StagedMedia::upload(&store, &mut form, MediaFolder::Projects)
            .await
            .unwrap();
        assert!(staged.thumbnail.is_some());
        assert_eq!(staged.images.as_ref().map(Vec::len), Some(2));
        assert_eq!(store.stored_ids().len(), 3);

        staged.rollback(&store).await;
        assert!(store.stored_ids().is_empty());
    }

    #[tokio::test]
    async fn test_staged_media_rejects_before_uploading() {
        let store = MemoryMediaStore::default();
        let mut bad = image_file("images");
        bad.file_name = "notes.txt".to_string();
        let mut form = FormData::new(Payload::default(), vec![image_file("thumbnail"), bad]);

        let result = StagedMedia::upload(&store, &mut form, MediaFolder::Projects).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(store.stored_ids().is_empty());
    }
}
