use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::SaleProjectRecord;

const SALE_COLUMNS: &str = "id, title, slug, short_description, description, price, currency, \
     category, technologies, duration, implementation_guide, features, includes, demo_url, \
     github_url, contact_url, thumbnail, images, is_visible, is_featured, order_index, \
     created_at, updated_at";

#[derive(Clone, Debug, Default)]
pub struct SaleFilter {
    pub category: Option<String>,
    pub featured: bool,
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a SaleFilter) {
    builder.push(" WHERE is_visible = 1");
    if let Some(category) = &filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if filter.featured {
        builder.push(" AND is_featured = 1");
    }
}

pub async fn list_visible(
    pool: &SqlitePool,
    filter: &SaleFilter,
    order_clause: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<SaleProjectRecord>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sale_projects"));
    push_filters(&mut builder, filter);
    builder
        .push(format!(" ORDER BY {order_clause}, id"))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder
        .build_query_as::<SaleProjectRecord>()
        .fetch_all(pool)
        .await
}

pub async fn count_visible(pool: &SqlitePool, filter: &SaleFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM sale_projects");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<SaleProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, SaleProjectRecord>(&format!(
        "SELECT {SALE_COLUMNS} FROM sale_projects ORDER BY order_index ASC, created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Slugs are stored lowercase, so the lookup lowercases its input.
pub async fn fetch_visible_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<SaleProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, SaleProjectRecord>(&format!(
        "SELECT {SALE_COLUMNS} FROM sale_projects WHERE slug = ? AND is_visible = 1"
    ))
    .bind(slug.trim().to_lowercase())
    .fetch_optional(pool)
    .await
}

pub async fn fetch_sale_project_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<SaleProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, SaleProjectRecord>(&format!(
        "SELECT {SALE_COLUMNS} FROM sale_projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_sale_project(
    pool: &SqlitePool,
    item: &SaleProjectRecord,
    slug: String,
) -> Result<SaleProjectRecord, sqlx::Error> {
    sqlx::query_as::<_, SaleProjectRecord>(&format!(
        "INSERT INTO sale_projects ({SALE_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {SALE_COLUMNS}"
    ))
    .bind(&item.id)
    .bind(&item.title)
    .bind(slug)
    .bind(&item.short_description)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.currency)
    .bind(item.category)
    .bind(&item.technologies)
    .bind(&item.duration)
    .bind(&item.implementation_guide)
    .bind(&item.features)
    .bind(&item.includes)
    .bind(&item.demo_url)
    .bind(&item.github_url)
    .bind(&item.contact_url)
    .bind(&item.thumbnail)
    .bind(&item.images)
    .bind(item.is_visible)
    .bind(item.is_featured)
    .bind(item.order_index)
    .bind(item.created_at)
    .bind(item.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn update_sale_project(
    pool: &SqlitePool,
    item: &SaleProjectRecord,
) -> Result<SaleProjectRecord, sqlx::Error> {
    sqlx::query_as::<_, SaleProjectRecord>(&format!(
        "UPDATE sale_projects SET title = ?, short_description = ?, description = ?, price = ?, \
         currency = ?, category = ?, technologies = ?, duration = ?, implementation_guide = ?, \
         features = ?, includes = ?, demo_url = ?, github_url = ?, contact_url = ?, \
         thumbnail = ?, images = ?, is_visible = ?, is_featured = ?, order_index = ?, \
         updated_at = ? WHERE id = ? RETURNING {SALE_COLUMNS}"
    ))
    .bind(&item.title)
    .bind(&item.short_description)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.currency)
    .bind(item.category)
    .bind(&item.technologies)
    .bind(&item.duration)
    .bind(&item.implementation_guide)
    .bind(&item.features)
    .bind(&item.includes)
    .bind(&item.demo_url)
    .bind(&item.github_url)
    .bind(&item.contact_url)
    .bind(&item.thumbnail)
    .bind(&item.images)
    .bind(item.is_visible)
    .bind(item.is_featured)
    .bind(item.order_index)
    .bind(item.updated_at)
    .bind(&item.id)
    .fetch_one(pool)
    .await
}

pub async fn delete_sale_project(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sale_projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaAsset;
    use crate::sale_project::models::{Currency, SaleCategory};
    use crate::test_helpers::create_test_pool;

    fn sample(title: &str, category: SaleCategory) -> SaleProjectRecord {
        let mut item = SaleProjectRecord::draft(MediaAsset {
            public_id: "portfolio/sale-projects/x".to_string(),
            url: "https://media.test/x.png".to_string(),
        });
        item.title = title.to_string();
        item.short_description = "Short".to_string();
        item.description = "Long description".to_string();
        item.price = 999.0;
        item.category = category;
        item
    }

    #[tokio::test]
    async fn test_slug_lookup_is_case_insensitive() {
        let pool = create_test_pool().await.unwrap();
        let item = sample("Shop Kit", SaleCategory::Node);
        insert_sale_project(&pool, &item, "shop-kit".to_string())
            .await
            .unwrap();

        let found = fetch_visible_by_slug(&pool, "Shop-KIT").await.unwrap().unwrap();
        assert_eq!(found.id, item.id);
        assert_eq!(found.currency, Currency::Inr);
        assert_eq!(found.category, SaleCategory::Node);
    }

    #[tokio::test]
    async fn test_filters_and_admin_order() {
        let pool = create_test_pool().await.unwrap();
        let mut first = sample("First", SaleCategory::React);
        first.order_index = 2;
        insert_sale_project(&pool, &first, "first".to_string()).await.unwrap();
        let mut second = sample("Second", SaleCategory::Python);
        second.is_featured = true;
        second.order_index = 1;
        insert_sale_project(&pool, &second, "second".to_string()).await.unwrap();
        let mut hidden = sample("Hidden", SaleCategory::React);
        hidden.is_visible = false;
        insert_sale_project(&pool, &hidden, "hidden".to_string()).await.unwrap();

        let react = SaleFilter {
            category: Some("react".to_string()),
            featured: false,
        };
        assert_eq!(count_visible(&pool, &react).await.unwrap(), 1);
        let featured = SaleFilter {
            category: None,
            featured: true,
        };
        let rows = list_visible(&pool, &featured, "order_index ASC", 12, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].slug, "second");

        let all: Vec<_> = list_all(&pool).await.unwrap().into_iter().map(|i| i.slug).collect();
        assert_eq!(all, vec!["hidden", "second", "first"]);
    }
}
