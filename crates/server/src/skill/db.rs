use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{SkillOrder, SkillRecord};

const SKILL_COLUMNS: &str =
    "id, name, category, proficiency, icon, color, order_index, is_visible, created_at, updated_at";

pub async fn list_visible(
    pool: &SqlitePool,
    category: Option<&str>,
) -> Result<Vec<SkillRecord>, sqlx::Error> {
    sqlx::query_as::<_, SkillRecord>(&format!(
        "SELECT {SKILL_COLUMNS} FROM skills WHERE is_visible = 1 AND (?1 IS NULL OR category = ?1) \
         ORDER BY category ASC, order_index ASC, proficiency DESC"
    ))
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<SkillRecord>, sqlx::Error> {
    sqlx::query_as::<_, SkillRecord>(&format!(
        "SELECT {SKILL_COLUMNS} FROM skills ORDER BY category ASC, order_index ASC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn fetch_skill_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<SkillRecord>, sqlx::Error> {
    sqlx::query_as::<_, SkillRecord>(&format!("SELECT {SKILL_COLUMNS} FROM skills WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_skill(
    pool: &SqlitePool,
    skill: &SkillRecord,
) -> Result<SkillRecord, sqlx::Error> {
    sqlx::query_as::<_, SkillRecord>(&format!(
        "INSERT INTO skills ({SKILL_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {SKILL_COLUMNS}"
    ))
    .bind(&skill.id)
    .bind(&skill.name)
    .bind(skill.category)
    .bind(skill.proficiency)
    .bind(&skill.icon)
    .bind(&skill.color)
    .bind(skill.order_index)
    .bind(skill.is_visible)
    .bind(skill.created_at)
    .bind(skill.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn update_skill(
    pool: &SqlitePool,
    skill: &SkillRecord,
) -> Result<SkillRecord, sqlx::Error> {
    sqlx::query_as::<_, SkillRecord>(&format!(
        "UPDATE skills SET name = ?, category = ?, proficiency = ?, icon = ?, color = ?, \
         order_index = ?, is_visible = ?, updated_at = ? WHERE id = ? RETURNING {SKILL_COLUMNS}"
    ))
    .bind(&skill.name)
    .bind(skill.category)
    .bind(skill.proficiency)
    .bind(&skill.icon)
    .bind(&skill.color)
    .bind(skill.order_index)
    .bind(skill.is_visible)
    .bind(skill.updated_at)
    .bind(&skill.id)
    .fetch_one(pool)
    .await
}

pub async fn delete_skill(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM skills WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn toggle_visibility(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<SkillRecord>, sqlx::Error> {
    sqlx::query_as::<_, SkillRecord>(&format!(
        "UPDATE skills SET is_visible = NOT is_visible, updated_at = ? WHERE id = ? \
         RETURNING {SKILL_COLUMNS}"
    ))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Applies every `(id, order)` pair in one transaction. Unknown ids are
/// skipped.
pub async fn reorder_skills(pool: &SqlitePool, orders: &[SkillOrder]) -> Result<u64, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut updated = 0;
    for entry in orders {
        let result = sqlx::query("UPDATE skills SET order_index = ?, updated_at = ? WHERE id = ?")
            .bind(entry.order)
            .bind(now)
            .bind(&entry.id)
            .execute(&mut *tx)
            .await?;
        updated += result.rows_affected();
    }
    tx.commit().await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::models::{SkillCategory, SkillPatch};
    use crate::test_helpers::create_test_pool;

    async fn add(
        pool: &SqlitePool,
        name: &str,
        category: SkillCategory,
        proficiency: i64,
        order: i64,
    ) -> SkillRecord {
        let skill = SkillRecord::from_patch(SkillPatch {
            name: Some(name.to_string()),
            category: Some(category),
            proficiency: Some(proficiency),
            order: Some(order),
            ..Default::default()
        })
        .unwrap();
        insert_skill(pool, &skill).await.unwrap()
    }

    #[tokio::test]
    async fn test_public_sort_and_category_filter() {
        let pool = create_test_pool().await.unwrap();
        add(&pool, "React", SkillCategory::Frontend, 90, 1).await;
        add(&pool, "Vue", SkillCategory::Frontend, 70, 1).await;
        add(&pool, "Node.js", SkillCategory::Backend, 85, 0).await;

        let names: Vec<_> = list_visible(&pool, None)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Node.js", "React", "Vue"]);

        let frontend = list_visible(&pool, Some("frontend")).await.unwrap();
        assert_eq!(frontend.len(), 2);
    }

    #[tokio::test]
    async fn test_reorder_is_applied() {
        let pool = create_test_pool().await.unwrap();
        let a = add(&pool, "Git", SkillCategory::Tools, 80, 0).await;
        let b = add(&pool, "Docker", SkillCategory::Tools, 75, 1).await;

        let updated = reorder_skills(
            &pool,
            &[
                SkillOrder { id: a.id.clone(), order: 1 },
                SkillOrder { id: b.id.clone(), order: 0 },
                SkillOrder { id: "missing".to_string(), order: 5 },
            ],
        )
        .await
        .unwrap();
        assert_eq!(updated, 2);

        let names: Vec<_> = list_all(&pool).await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Docker", "Git"]);
    }
}
