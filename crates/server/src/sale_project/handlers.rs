use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use serde::Deserialize;
use sqlx::types::Json;

use super::db::{self, SaleFilter};
use super::input::SaleProjectPatch;
use super::models::{SALE_SORT_COLUMNS, SaleProjectPage, SaleProjectRecord};
use crate::api::form::FormData;
use crate::api::query::{order_by, page_window};
use crate::api::response::{Pagination, Reply};
use crate::auth::AdminUser;
use crate::catalog::{CatalogKind, StagedMedia, insert_with_unique_slug};
use crate::errors::{ApiError, ApiResult, bad_request, not_found};
use crate::media::{self, MediaAsset, MediaFolder};
use crate::state::AppState;
use crate::validation::slug::validate_slug;

const DEFAULT_PAGE_SIZE: i64 = 12;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sale_projects).post(create_sale_project))
        .route("/detail/{slug}", get(sale_project_by_slug))
        .route("/admin/all", get(admin_sale_projects))
        .route("/{id}", put(update_sale_project).delete(delete_sale_project))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleListParams {
    pub category: Option<String>,
    pub featured: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

fn sale_project_not_found() -> ApiError {
    not_found("Sale project not found")
}

fn attach(item: &mut SaleProjectRecord, staged: &StagedMedia) {
    if let Some(thumbnail) = &staged.thumbnail {
        item.thumbnail = Json(thumbnail.clone());
    }
    if let Some(images) = &staged.images {
        item.images = Json(images.clone());
    }
}

async fn list_sale_projects(
    State(state): State<AppState>,
    Query(params): Query<SaleListParams>,
) -> ApiResult<Reply<SaleProjectPage>> {
    let (page, limit) =
        page_window(params.page.as_deref(), params.limit.as_deref(), DEFAULT_PAGE_SIZE)?;
    let order = order_by(params.sort.as_deref(), "order -createdAt", SALE_SORT_COLUMNS)?;
    let filter = SaleFilter {
        category: params
            .category
            .filter(|category| !category.is_empty() && category != "all"),
        featured: params.featured.as_deref() == Some("true"),
    };

    let total = db::count_visible(&state.pool, &filter).await?;
    let pagination = Pagination::new(page, limit, total);
    let items = db::list_visible(&state.pool, &filter, &order, limit, pagination.offset()).await?;

    Ok(Reply::ok(
        SaleProjectPage { items, pagination },
        "Sale projects retrieved successfully",
    ))
}

async fn sale_project_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Reply<SaleProjectRecord>> {
    validate_slug(&slug.trim().to_lowercase()).map_err(|_| sale_project_not_found())?;
    let item = db::fetch_visible_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(sale_project_not_found)?;
    Ok(Reply::ok(item, "Sale project retrieved successfully"))
}

async fn admin_sale_projects(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Reply<Vec<SaleProjectRecord>>> {
    let items = db::list_all(&state.pool).await?;
    Ok(Reply::ok(items, "Admin sale projects retrieved successfully"))
}

async fn create_sale_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut form: FormData,
) -> ApiResult<Reply<SaleProjectRecord>> {
    let patch = SaleProjectPatch::from_payload(&form.payload)?;
    patch.check_required()?;
    if patch.thumbnail.is_none() && !form.has_file("thumbnail") {
        return Err(bad_request("Thumbnail is required"));
    }

    let store = state.media.as_ref();
    let staged = StagedMedia::upload(store, &mut form, MediaFolder::SaleProjects).await?;
    let mut item = SaleProjectRecord::draft(MediaAsset::default());
    item.apply(patch);
    attach(&mut item, &staged);

    let pool = &state.pool;
    let record = &item;
    let created =
        insert_with_unique_slug(pool, CatalogKind::SaleProjects, &item.title, move |slug| {
            db::insert_sale_project(pool, record, slug)
        })
        .await;

    match created {
        Ok(created) => {
            tracing::info!(id = %created.id, slug = %created.slug, "sale project created");
            Ok(Reply::created(created, "Sale project created successfully"))
        }
        Err(err) => {
            staged.rollback(store).await;
            Err(err)
        }
    }
}

async fn update_sale_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    mut form: FormData,
) -> ApiResult<Reply<SaleProjectRecord>> {
    let existing = db::fetch_sale_project_by_id(&state.pool, &id)
        .await?
        .ok_or_else(sale_project_not_found)?;
    let patch = SaleProjectPatch::from_payload(&form.payload)?;

    let store = state.media.as_ref();
    let staged = StagedMedia::upload(store, &mut form, MediaFolder::SaleProjects).await?;
    let mut item = existing.clone();
    item.apply(patch);
    attach(&mut item, &staged);

    match db::update_sale_project(&state.pool, &item).await {
        Ok(updated) => {
            let before: Vec<_> = std::iter::once(&existing.thumbnail.0)
                .chain(existing.images.iter())
                .collect();
            let after: Vec<_> = std::iter::once(&updated.thumbnail.0)
                .chain(updated.images.iter())
                .collect();
            media::discard(store, &media::orphaned(&before, &after)).await;
            Ok(Reply::ok(updated, "Sale project updated successfully"))
        }
        Err(err) => {
            staged.rollback(store).await;
            Err(err.into())
        }
    }
}

async fn delete_sale_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    let item = db::fetch_sale_project_by_id(&state.pool, &id)
        .await?
        .ok_or_else(sale_project_not_found)?;
    db::delete_sale_project(&state.pool, &id).await?;

    let store = state.media.as_ref();
    media::discard(store, std::iter::once(&item.thumbnail.0)).await;
    media::discard(store, item.images.iter()).await;
    tracing::info!(id = %item.id, "sale project deleted");

    Ok(Reply::ok((), "Sale project deleted successfully"))
}
