use chrono::Utc;
use sqlx::SqlitePool;

use super::models::AboutRecord;

pub const PROFILE_ID: &str = "profile";

const ABOUT_COLUMNS: &str = "id, name, title, subtitle, bio, short_bio, avatar, resume, email, \
     phone, location, social_links, experience, education, years_of_experience, \
     projects_completed, happy_clients, seo_title, seo_description, seo_keywords, \
     created_at, updated_at";

pub async fn fetch_about(pool: &SqlitePool) -> Result<Option<AboutRecord>, sqlx::Error> {
    sqlx::query_as::<_, AboutRecord>(&format!("SELECT {ABOUT_COLUMNS} FROM about WHERE id = ?"))
        .bind(PROFILE_ID)
        .fetch_optional(pool)
        .await
}

/// Returns the profile, inserting the placeholder one on first use.
/// Concurrent first reads race on the fixed key and all see one row.
pub async fn get_or_create_default(pool: &SqlitePool) -> Result<AboutRecord, sqlx::Error> {
    let now = Utc::now();
    let inserted = sqlx::query(
        "INSERT INTO about (id, name, title, bio, email, created_at, updated_at) \
         VALUES (?, 'Your Name', 'Full Stack Developer', 'Add your bio here...', \
         'your@email.com', ?, ?) ON CONFLICT (id) DO NOTHING",
    )
    .bind(PROFILE_ID)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    if inserted.rows_affected() > 0 {
        tracing::info!("created default profile");
    }

    sqlx::query_as::<_, AboutRecord>(&format!("SELECT {ABOUT_COLUMNS} FROM about WHERE id = ?"))
        .bind(PROFILE_ID)
        .fetch_one(pool)
        .await
}

pub async fn save_about(
    pool: &SqlitePool,
    about: &AboutRecord,
) -> Result<AboutRecord, sqlx::Error> {
    sqlx::query_as::<_, AboutRecord>(&format!(
        "UPDATE about SET name = ?, title = ?, subtitle = ?, bio = ?, short_bio = ?, avatar = ?, \
         resume = ?, email = ?, phone = ?, location = ?, social_links = ?, experience = ?, \
         education = ?, years_of_experience = ?, projects_completed = ?, happy_clients = ?, \
         seo_title = ?, seo_description = ?, seo_keywords = ?, updated_at = ? \
         WHERE id = ? RETURNING {ABOUT_COLUMNS}"
    ))
    .bind(&about.name)
    .bind(&about.title)
    .bind(&about.subtitle)
    .bind(&about.bio)
    .bind(&about.short_bio)
    .bind(&about.avatar)
    .bind(&about.resume)
    .bind(&about.email)
    .bind(&about.phone)
    .bind(&about.location)
    .bind(&about.social_links)
    .bind(&about.experience)
    .bind(&about.education)
    .bind(about.years_of_experience)
    .bind(about.projects_completed)
    .bind(about.happy_clients)
    .bind(&about.seo_title)
    .bind(&about.seo_description)
    .bind(&about.seo_keywords)
    .bind(about.updated_at)
    .bind(PROFILE_ID)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::about::entries::ExperienceEntry;
    use crate::media::MediaAsset;
    use crate::test_helpers::create_test_pool;
    use sqlx::types::Json;

    #[tokio::test]
    async fn test_default_profile_is_created_once() {
        let pool = create_test_pool().await.unwrap();
        assert!(fetch_about(&pool).await.unwrap().is_none());

        let first = get_or_create_default(&pool).await.unwrap();
        assert_eq!(first.name, "Your Name");
        assert_eq!(first.title, "Full Stack Developer");
        assert_eq!(first.email, "your@email.com");
        assert!(first.experience.is_empty());

        let second = get_or_create_default(&pool).await.unwrap();
        assert_eq!(second.created_at, first.created_at);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM about")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_save_round_trips_nested_fields() {
        let pool = create_test_pool().await.unwrap();
        let mut about = get_or_create_default(&pool).await.unwrap();
        about.avatar = Some(Json(MediaAsset {
            public_id: "portfolio/about/me.png".to_string(),
            url: "https://media.test/portfolio/about/me.png".to_string(),
        }));
        about.experience.0.push(ExperienceEntry {
            id: "exp1".to_string(),
            company: Some("Acme".to_string()),
            current: true,
            ..Default::default()
        });
        about.seo_keywords = Json(vec!["rust".to_string()]);

        let saved = save_about(&pool, &about).await.unwrap();
        assert_eq!(
            saved.avatar.as_ref().map(|a| a.public_id.as_str()),
            Some("portfolio/about/me.png")
        );
        assert_eq!(saved.experience[0].company.as_deref(), Some("Acme"));
        assert_eq!(*saved.seo_keywords, vec!["rust".to_string()]);
    }
}
