use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::ProjectRecord;

const PROJECT_COLUMNS: &str = "id, title, slug, description, long_description, thumbnail, images, \
     technologies, category, live_url, github_url, featured, status, start_date, end_date, \
     order_index, is_visible, created_at, updated_at";

/// Filters of the public listing. Values are matched verbatim, so an
/// unknown category simply matches nothing.
#[derive(Clone, Debug, Default)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: bool,
    pub status: Option<String>,
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProjectFilter) {
    builder.push(" WHERE is_visible = 1");
    if let Some(category) = &filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if filter.featured {
        builder.push(" AND featured = 1");
    }
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

/// `order_clause` must come from [`crate::api::query::order_by`].
pub async fn list_visible(
    pool: &SqlitePool,
    filter: &ProjectFilter,
    order_clause: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<ProjectRecord>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects"));
    push_filters(&mut builder, filter);
    builder
        .push(format!(" ORDER BY {order_clause}, id"))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder.build_query_as::<ProjectRecord>().fetch_all(pool).await
}

pub async fn count_visible(pool: &SqlitePool, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM projects");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn list_featured(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE is_visible = 1 AND featured = 1 \
         ORDER BY order_index ASC, created_at DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn fetch_visible_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<ProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = ? AND is_visible = 1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_project_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<ProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_project(
    pool: &SqlitePool,
    project: &ProjectRecord,
    slug: String,
) -> Result<ProjectRecord, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "INSERT INTO projects ({PROJECT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(&project.id)
    .bind(&project.title)
    .bind(slug)
    .bind(&project.description)
    .bind(&project.long_description)
    .bind(&project.thumbnail)
    .bind(&project.images)
    .bind(&project.technologies)
    .bind(project.category)
    .bind(&project.live_url)
    .bind(&project.github_url)
    .bind(project.featured)
    .bind(project.status)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(project.order_index)
    .bind(project.is_visible)
    .bind(project.created_at)
    .bind(project.updated_at)
    .fetch_one(pool)
    .await
}

/// Writes every mutable column of `project`; `slug` and `created_at` stay.
pub async fn update_project(
    pool: &SqlitePool,
    project: &ProjectRecord,
) -> Result<ProjectRecord, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "UPDATE projects SET title = ?, description = ?, long_description = ?, thumbnail = ?, \
         images = ?, technologies = ?, category = ?, live_url = ?, github_url = ?, featured = ?, \
         status = ?, start_date = ?, end_date = ?, order_index = ?, is_visible = ?, updated_at = ? \
         WHERE id = ? RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.long_description)
    .bind(&project.thumbnail)
    .bind(&project.images)
    .bind(&project.technologies)
    .bind(project.category)
    .bind(&project.live_url)
    .bind(&project.github_url)
    .bind(project.featured)
    .bind(project.status)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(project.order_index)
    .bind(project.is_visible)
    .bind(project.updated_at)
    .bind(&project.id)
    .fetch_one(pool)
    .await
}

pub async fn delete_project(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Flips a boolean column and returns the updated row.
async fn toggle(
    pool: &SqlitePool,
    id: &str,
    column: &'static str,
) -> Result<Option<ProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(&format!(
        "UPDATE projects SET {column} = NOT {column}, updated_at = ? WHERE id = ? \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn toggle_visibility(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<ProjectRecord>, sqlx::Error> {
    toggle(pool, id, "is_visible").await
}

pub async fn toggle_featured(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<ProjectRecord>, sqlx::Error> {
    toggle(pool, id, "featured").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaAsset;
    use crate::project::models::ProjectCategory;
    use crate::test_helpers::create_test_pool;

    fn sample(title: &str) -> ProjectRecord {
        let mut project = ProjectRecord::draft(MediaAsset {
            public_id: String::new(),
            url: "https://images.example.com/t.png".to_string(),
        });
        project.title = title.to_string();
        project.description = "A project used in tests".to_string();
        project
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let pool = create_test_pool().await.unwrap();
        let mut project = sample("Task App");
        project.technologies = sqlx::types::Json(vec!["Rust".to_string()]);
        project.category = ProjectCategory::Api;

        let stored = insert_project(&pool, &project, "task-app".to_string()).await.unwrap();
        assert_eq!(stored.slug, "task-app");
        assert_eq!(stored.technologies.0, vec!["Rust"]);

        let by_slug = fetch_visible_by_slug(&pool, "task-app").await.unwrap().unwrap();
        assert_eq!(by_slug.id, project.id);
        assert_eq!(by_slug.category, ProjectCategory::Api);
    }

    #[tokio::test]
    async fn test_filters_and_toggles() {
        let pool = create_test_pool().await.unwrap();
        let mut web = sample("Web One");
        web.featured = true;
        insert_project(&pool, &web, "web-one".to_string()).await.unwrap();
        let mut mobile = sample("Mobile One");
        mobile.category = ProjectCategory::Mobile;
        insert_project(&pool, &mobile, "mobile-one".to_string()).await.unwrap();

        let featured = ProjectFilter {
            featured: true,
            ..Default::default()
        };
        assert_eq!(count_visible(&pool, &featured).await.unwrap(), 1);

        let by_category = ProjectFilter {
            category: Some("mobile".to_string()),
            ..Default::default()
        };
        let rows = list_visible(&pool, &by_category, "created_at DESC", 10, 0)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].slug, "mobile-one");

        let hidden = toggle_visibility(&pool, &mobile.id).await.unwrap().unwrap();
        assert!(!hidden.is_visible);
        assert_eq!(count_visible(&pool, &ProjectFilter::default()).await.unwrap(), 1);
        assert!(fetch_visible_by_slug(&pool, "mobile-one").await.unwrap().is_none());

        assert!(toggle_featured(&pool, "missing").await.unwrap().is_none());
    }
}
