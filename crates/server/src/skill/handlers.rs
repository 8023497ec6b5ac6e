use std::collections::BTreeMap;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, put};
use serde::{Deserialize, Serialize};

use super::db;
use super::models::{SkillOrder, SkillPatch, SkillRecord};
use crate::api::form::FormData;
use crate::api::response::Reply;
use crate::auth::AdminUser;
use crate::errors::{ApiError, ApiResult, bad_request, not_found};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_skills).post(create_skill))
        .route("/admin/all", get(admin_skills))
        .route("/reorder", put(reorder_skills))
        .route("/{id}", get(skill_by_id).put(update_skill).delete(delete_skill))
        .route("/{id}/visibility", patch(toggle_visibility))
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillListParams {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillListing {
    pub skills: Vec<SkillRecord>,
    pub grouped: BTreeMap<&'static str, Vec<SkillRecord>>,
}

fn skill_not_found() -> ApiError {
    not_found("Skill not found")
}

fn group_by_category(skills: &[SkillRecord]) -> BTreeMap<&'static str, Vec<SkillRecord>> {
    let mut grouped: BTreeMap<&'static str, Vec<SkillRecord>> = BTreeMap::new();
    for skill in skills {
        grouped
            .entry(skill.category.as_str())
            .or_default()
            .push(skill.clone());
    }
    grouped
}

async fn list_skills(
    State(state): State<AppState>,
    Query(params): Query<SkillListParams>,
) -> ApiResult<Reply<SkillListing>> {
    let category = params
        .category
        .as_deref()
        .filter(|category| !category.is_empty() && *category != "all");
    let skills = db::list_visible(&state.pool, category).await?;
    let grouped = group_by_category(&skills);
    Ok(Reply::ok(
        SkillListing { skills, grouped },
        "Skills retrieved successfully",
    ))
}

async fn admin_skills(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Reply<Vec<SkillRecord>>> {
    let skills = db::list_all(&state.pool).await?;
    Ok(Reply::ok(skills, "All skills retrieved successfully"))
}

async fn skill_by_id(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<SkillRecord>> {
    let skill = db::fetch_skill_by_id(&state.pool, &id)
        .await?
        .ok_or_else(skill_not_found)?;
    Ok(Reply::ok(skill, "Skill retrieved successfully"))
}

async fn create_skill(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<SkillRecord>> {
    let patch = SkillPatch::from_payload(&form.payload)?;
    patch.check_required()?;
    let skill = SkillRecord::from_patch(patch).ok_or_else(|| bad_request("Category is required"))?;
    let created = db::insert_skill(&state.pool, &skill).await?;
    Ok(Reply::created(created, "Skill created successfully"))
}

async fn update_skill(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    form: FormData,
) -> ApiResult<Reply<SkillRecord>> {
    let mut skill = db::fetch_skill_by_id(&state.pool, &id)
        .await?
        .ok_or_else(skill_not_found)?;
    skill.apply(SkillPatch::from_payload(&form.payload)?);
    let updated = db::update_skill(&state.pool, &skill).await?;
    Ok(Reply::ok(updated, "Skill updated successfully"))
}

async fn delete_skill(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    if db::delete_skill(&state.pool, &id).await? == 0 {
        return Err(skill_not_found());
    }
    Ok(Reply::ok((), "Skill deleted successfully"))
}

async fn toggle_visibility(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<SkillRecord>> {
    let skill = db::toggle_visibility(&state.pool, &id)
        .await?
        .ok_or_else(skill_not_found)?;
    let message = if skill.is_visible {
        "Skill shown successfully"
    } else {
        "Skill hidden successfully"
    };
    Ok(Reply::ok(skill, message))
}

async fn reorder_skills(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<Vec<SkillRecord>>> {
    let orders: Vec<SkillOrder> = form
        .payload
        .json("skills")
        .ok()
        .flatten()
        .ok_or_else(|| bad_request("Skills array is required"))?;

    let updated = db::reorder_skills(&state.pool, &orders).await?;
    tracing::debug!(updated, "skills reordered");

    let skills = db::list_all(&state.pool).await?;
    Ok(Reply::ok(skills, "Skills reordered successfully"))
}
