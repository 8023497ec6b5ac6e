use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use serde::Deserialize;
use sqlx::types::Json;

use super::db::{self, ProjectFilter};
use super::input::ProjectPatch;
use super::models::{PROJECT_SORT_COLUMNS, ProjectPage, ProjectRecord};
use crate::api::form::FormData;
use crate::api::query::{order_by, page_window};
use crate::api::response::{Pagination, Reply};
use crate::auth::AdminUser;
use crate::catalog::{CatalogKind, StagedMedia, insert_with_unique_slug};
use crate::errors::{ApiError, ApiResult, bad_request, not_found};
use crate::media::{self, MediaAsset, MediaFolder};
use crate::state::AppState;
use crate::validation::slug::validate_slug;

const DEFAULT_PAGE_SIZE: i64 = 10;
const FEATURED_LIMIT: i64 = 6;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/featured", get(featured_projects))
        .route("/admin/all", get(admin_projects))
        .route("/id/{id}", get(project_by_id))
        .route(
            "/{id}",
            get(project_by_slug).put(update_project).delete(delete_project),
        )
        .route("/{id}/visibility", patch(toggle_visibility))
        .route("/{id}/featured", patch(toggle_featured))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListParams {
    pub category: Option<String>,
    pub featured: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

impl ProjectListParams {
    fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            category: self
                .category
                .clone()
                .filter(|category| !category.is_empty() && category != "all"),
            featured: self.featured.as_deref() == Some("true"),
            status: self.status.clone().filter(|status| !status.is_empty()),
        }
    }
}

fn project_not_found() -> ApiError {
    not_found("Project not found")
}

/// Uploaded files win over a thumbnail given by URL in the body.
fn attach(project: &mut ProjectRecord, staged: &StagedMedia) {
    if let Some(thumbnail) = &staged.thumbnail {
        project.thumbnail = Json(thumbnail.clone());
    }
    if let Some(images) = &staged.images {
        project.images = Json(images.clone());
    }
}

async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> ApiResult<Reply<ProjectPage>> {
    let (page, limit) =
        page_window(params.page.as_deref(), params.limit.as_deref(), DEFAULT_PAGE_SIZE)?;
    let order = order_by(params.sort.as_deref(), "-createdAt", PROJECT_SORT_COLUMNS)?;
    let filter = params.filter();

    let total = db::count_visible(&state.pool, &filter).await?;
    let pagination = Pagination::new(page, limit, total);
    let projects =
        db::list_visible(&state.pool, &filter, &order, limit, pagination.offset()).await?;

    Ok(Reply::ok(
        ProjectPage {
            projects,
            pagination,
        },
        "Projects retrieved successfully",
    ))
}

async fn featured_projects(State(state): State<AppState>) -> ApiResult<Reply<Vec<ProjectRecord>>> {
    let projects = db::list_featured(&state.pool, FEATURED_LIMIT).await?;
    Ok(Reply::ok(projects, "Featured projects retrieved successfully"))
}

async fn project_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Reply<ProjectRecord>> {
    validate_slug(&slug).map_err(|_| project_not_found())?;
    let project = db::fetch_visible_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(project_not_found)?;
    Ok(Reply::ok(project, "Project retrieved successfully"))
}

async fn admin_projects(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Reply<Vec<ProjectRecord>>> {
    let projects = db::list_all(&state.pool).await?;
    Ok(Reply::ok(projects, "All projects retrieved successfully"))
}

async fn project_by_id(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<ProjectRecord>> {
    let project = db::fetch_project_by_id(&state.pool, &id)
        .await?
        .ok_or_else(project_not_found)?;
    Ok(Reply::ok(project, "Project retrieved successfully"))
}

async fn create_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut form: FormData,
) -> ApiResult<Reply<ProjectRecord>> {
    let patch = ProjectPatch::from_payload(&form.payload)?;
    patch.check_required()?;

    if patch.thumbnail.is_none() && !form.has_file("thumbnail") {
        return Err(bad_request("Thumbnail is required"));
    }

    let store = state.media.as_ref();
    let staged = StagedMedia::upload(store, &mut form, MediaFolder::Projects).await?;
    let mut project = ProjectRecord::draft(MediaAsset::default());
    project.apply(patch);
    attach(&mut project, &staged);

    let pool = &state.pool;
    let record = &project;
    let created =
        insert_with_unique_slug(pool, CatalogKind::Projects, &project.title, move |slug| {
            db::insert_project(pool, record, slug)
        })
        .await;

    match created {
        Ok(created) => {
            tracing::info!(id = %created.id, slug = %created.slug, "project created");
            Ok(Reply::created(created, "Project created successfully"))
        }
        Err(err) => {
            staged.rollback(store).await;
            Err(err)
        }
    }
}

async fn update_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    mut form: FormData,
) -> ApiResult<Reply<ProjectRecord>> {
    let existing = db::fetch_project_by_id(&state.pool, &id)
        .await?
        .ok_or_else(project_not_found)?;
    let patch = ProjectPatch::from_payload(&form.payload)?;

    let store = state.media.as_ref();
    let staged = StagedMedia::upload(store, &mut form, MediaFolder::Projects).await?;
    let mut project = existing.clone();
    project.apply(patch);
    attach(&mut project, &staged);

    match db::update_project(&state.pool, &project).await {
        Ok(updated) => {
            let before: Vec<_> = std::iter::once(&existing.thumbnail.0)
                .chain(existing.images.iter())
                .collect();
            let after: Vec<_> = std::iter::once(&updated.thumbnail.0)
                .chain(updated.images.iter())
                .collect();
            media::discard(store, &media::orphaned(&before, &after)).await;
            Ok(Reply::ok(updated, "Project updated successfully"))
        }
        Err(err) => {
            staged.rollback(store).await;
            Err(err.into())
        }
    }
}

async fn delete_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    let project = db::fetch_project_by_id(&state.pool, &id)
        .await?
        .ok_or_else(project_not_found)?;
    db::delete_project(&state.pool, &id).await?;

    let store = state.media.as_ref();
    media::discard(store, std::iter::once(&project.thumbnail.0)).await;
    media::discard(store, project.images.iter()).await;
    tracing::info!(id = %project.id, "project deleted");

    Ok(Reply::ok((), "Project deleted successfully"))
}

async fn toggle_visibility(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<ProjectRecord>> {
    let project = db::toggle_visibility(&state.pool, &id)
        .await?
        .ok_or_else(project_not_found)?;
    let message = if project.is_visible {
        "Project shown successfully"
    } else {
        "Project hidden successfully"
    };
    Ok(Reply::ok(project, message))
}

async fn toggle_featured(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<ProjectRecord>> {
    let project = db::toggle_featured(&state.pool, &id)
        .await?
        .ok_or_else(project_not_found)?;
    let message = if project.featured {
        "Project featured successfully"
    } else {
        "Project unfeatured successfully"
    };
    Ok(Reply::ok(project, message))
}
