use sqlx::SqlitePool;

use super::models::{
    CategoryCount, MessageActivityRow, Overview, ProjectActivityRow, RecentMessage,
    SkillCategoryStats,
};

pub async fn overview(pool: &SqlitePool) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "SELECT \
         (SELECT COUNT(*) FROM projects) AS total_projects, \
         (SELECT COUNT(*) FROM projects WHERE featured = 1) AS featured_projects, \
         (SELECT COUNT(*) FROM skills) AS total_skills, \
         (SELECT COUNT(*) FROM messages) AS total_messages, \
         (SELECT COUNT(*) FROM messages WHERE status = 'unread') AS unread_messages",
    )
    .fetch_one(pool)
    .await
}

pub async fn recent_messages(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<RecentMessage>, sqlx::Error> {
    sqlx::query_as::<_, RecentMessage>(
        "SELECT id, name, email, subject, status, created_at FROM messages \
         ORDER BY created_at DESC, id LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn projects_by_category(pool: &SqlitePool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT category, COUNT(*) AS count FROM projects \
         GROUP BY category ORDER BY count DESC, category ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn skills_by_category(pool: &SqlitePool) -> Result<Vec<SkillCategoryStats>, sqlx::Error> {
    sqlx::query_as::<_, SkillCategoryStats>(
        "SELECT category, COUNT(*) AS count, CAST(AVG(proficiency) AS REAL) AS avg_proficiency \
         FROM skills GROUP BY category ORDER BY count DESC, category ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn recent_projects(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ProjectActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectActivityRow>(
        "SELECT title, category, created_at FROM projects ORDER BY created_at DESC, id LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn recent_message_activity(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<MessageActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageActivityRow>(
        "SELECT name, subject, status, created_at FROM messages \
         ORDER BY created_at DESC, id LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_pool;

    async fn add_skill(pool: &SqlitePool, id: &str, category: &str, proficiency: i64) {
        sqlx::query(
            "INSERT INTO skills (id, name, category, proficiency, created_at, updated_at) \
             VALUES (?, ?, ?, ?, '2025-01-01T00:00:00+00:00', '2025-01-01T00:00:00+00:00')",
        )
        .bind(id)
        .bind(id)
        .bind(category)
        .bind(proficiency)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_empty_overview() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(overview(&pool).await.unwrap(), Overview::default());
        assert!(projects_by_category(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skill_averages() {
        let pool = create_test_pool().await.unwrap();
        add_skill(&pool, "react", "frontend", 90).await;
        add_skill(&pool, "vue", "frontend", 75).await;
        add_skill(&pool, "node", "backend", 80).await;

        let stats = skills_by_category(&pool).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].category, "frontend");
        assert_eq!(stats[0].count, 2);
        assert!((stats[0].avg_proficiency - 82.5).abs() < f64::EPSILON);
        assert_eq!(stats[1].category, "backend");
        assert_eq!(overview(&pool).await.unwrap().total_skills, 3);
    }
}
