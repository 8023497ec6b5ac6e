use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use chrono::Utc;
use sqlx::types::Json;

use super::db;
use super::entries::{EducationEntry, ExperienceEntry, ProfileEntry};
use super::models::{AboutPatch, AboutRecord};
use crate::api::form::FormData;
use crate::api::response::Reply;
use crate::auth::AdminUser;
use crate::errors::{ApiResult, bad_request, not_found};
use crate::media::{self, MediaAsset, MediaFolder, UploadedFile};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_about).put(update_about))
        .route("/avatar", put(update_avatar))
        .route("/resume", put(update_resume))
        .route("/experience", post(add_entry::<ExperienceEntry>))
        .route(
            "/experience/{entry_id}",
            put(update_entry::<ExperienceEntry>).delete(delete_entry::<ExperienceEntry>),
        )
        .route("/education", post(add_entry::<EducationEntry>))
        .route(
            "/education/{entry_id}",
            put(update_entry::<EducationEntry>).delete(delete_entry::<EducationEntry>),
        )
}

async fn get_about(State(state): State<AppState>) -> ApiResult<Reply<AboutRecord>> {
    let about = db::get_or_create_default(&state.pool).await?;
    Ok(Reply::ok(about, "About info retrieved successfully"))
}

async fn update_about(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<AboutRecord>> {
    let patch = AboutPatch::from_payload(&form.payload)?;
    let mut about = db::get_or_create_default(&state.pool).await?;
    about.apply(patch);
    let saved = db::save_about(&state.pool, &about).await?;
    Ok(Reply::ok(saved, "About info updated successfully"))
}

#[derive(Clone, Copy)]
enum ProfileAsset {
    Avatar,
    Resume,
}

impl ProfileAsset {
    fn field(self) -> &'static str {
        match self {
            ProfileAsset::Avatar => "avatar",
            ProfileAsset::Resume => "resume",
        }
    }

    fn check(self, file: &UploadedFile) -> ApiResult<()> {
        match self {
            ProfileAsset::Avatar => media::check_image(file),
            ProfileAsset::Resume => media::check_pdf(file),
        }
    }

    fn slot(self, about: &mut AboutRecord) -> &mut Option<Json<MediaAsset>> {
        match self {
            ProfileAsset::Avatar => &mut about.avatar,
            ProfileAsset::Resume => &mut about.resume,
        }
    }
}

/// Stores the new file first and removes the previous one only once the
/// profile points at its replacement.
async fn replace_asset(
    state: &AppState,
    mut form: FormData,
    asset: ProfileAsset,
    folder: MediaFolder,
    missing: &str,
) -> ApiResult<AboutRecord> {
    let file = form
        .take_file(asset.field())
        .ok_or_else(|| bad_request(missing))?;
    asset.check(&file)?;

    let store = state.media.as_ref();
    let uploaded = media::upload(store, &file, folder).await?;
    let mut about = db::get_or_create_default(&state.pool).await?;
    let previous = asset.slot(&mut about).replace(Json(uploaded.clone()));
    about.updated_at = Utc::now();

    match db::save_about(&state.pool, &about).await {
        Ok(saved) => {
            if let Some(previous) = previous {
                media::discard(store, std::iter::once(&previous.0)).await;
            }
            Ok(saved)
        }
        Err(err) => {
            media::discard(store, std::iter::once(&uploaded)).await;
            Err(err.into())
        }
    }
}

async fn update_avatar(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<AboutRecord>> {
    let about = replace_asset(
        &state,
        form,
        ProfileAsset::Avatar,
        MediaFolder::About,
        "Please upload an image",
    )
    .await?;
    Ok(Reply::ok(about, "Avatar updated successfully"))
}

async fn update_resume(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<AboutRecord>> {
    let about = replace_asset(
        &state,
        form,
        ProfileAsset::Resume,
        MediaFolder::Resume,
        "Please upload a PDF file",
    )
    .await?;
    Ok(Reply::ok(about, "Resume updated successfully"))
}

async fn add_entry<E: ProfileEntry>(
    State(state): State<AppState>,
    _admin: AdminUser,
    form: FormData,
) -> ApiResult<Reply<AboutRecord>> {
    let entry = E::from_payload(&form.payload)?;
    let mut about = db::get_or_create_default(&state.pool).await?;
    E::entries(&mut about).push(entry);
    about.updated_at = Utc::now();

    let saved = db::save_about(&state.pool, &about).await?;
    Ok(Reply::created(saved, format!("{} added successfully", E::LABEL)))
}

async fn update_entry<E: ProfileEntry>(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(entry_id): Path<String>,
    form: FormData,
) -> ApiResult<Reply<AboutRecord>> {
    let mut about = db::get_or_create_default(&state.pool).await?;
    let entry = E::entries(&mut about)
        .iter_mut()
        .find(|entry| entry.id() == entry_id)
        .ok_or_else(|| not_found(format!("{} not found", E::LABEL)))?;
    entry.merge(&form.payload)?;
    about.updated_at = Utc::now();

    let saved = db::save_about(&state.pool, &about).await?;
    Ok(Reply::ok(saved, format!("{} updated successfully", E::LABEL)))
}

/// Removing an id that is not present still succeeds.
async fn delete_entry<E: ProfileEntry>(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(entry_id): Path<String>,
) -> ApiResult<Reply<AboutRecord>> {
    let mut about = db::get_or_create_default(&state.pool).await?;
    E::entries(&mut about).retain(|entry| entry.id() != entry_id);
    about.updated_at = Utc::now();

    let saved = db::save_about(&state.pool, &about).await?;
    Ok(Reply::ok(saved, format!("{} deleted successfully", E::LABEL)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_state, image_file, pdf_file};
    use crate::validation::payload::Payload;

    fn form(files: Vec<UploadedFile>) -> FormData {
        FormData::new(Payload::default(), files)
    }

    #[tokio::test]
    async fn test_avatar_replacement_discards_previous() {
        let (state, store) = create_test_state().await.unwrap();

        let first = replace_asset(
            &state,
            form(vec![image_file("avatar")]),
            ProfileAsset::Avatar,
            MediaFolder::About,
            "Please upload an image",
        )
        .await
        .unwrap();
        let first_id = first.avatar.unwrap().0.public_id;
        assert!(first_id.starts_with("portfolio/about/"));

        let second = replace_asset(
            &state,
            form(vec![image_file("avatar")]),
            ProfileAsset::Avatar,
            MediaFolder::About,
            "Please upload an image",
        )
        .await
        .unwrap();
        let second_id = second.avatar.unwrap().0.public_id;

        assert_eq!(store.deleted_ids(), vec![first_id]);
        assert_eq!(store.stored_ids(), vec![second_id]);
    }

    #[tokio::test]
    async fn test_resume_requires_pdf() {
        let (state, store) = create_test_state().await.unwrap();

        let missing = replace_asset(
            &state,
            form(Vec::new()),
            ProfileAsset::Resume,
            MediaFolder::Resume,
            "Please upload a PDF file",
        )
        .await
        .unwrap_err();
        assert_eq!(missing.to_string(), "Please upload a PDF file");

        let wrong_kind = replace_asset(
            &state,
            form(vec![image_file("resume")]),
            ProfileAsset::Resume,
            MediaFolder::Resume,
            "Please upload a PDF file",
        )
        .await;
        assert!(wrong_kind.is_err());
        assert!(store.stored_ids().is_empty());

        let saved = replace_asset(
            &state,
            form(vec![pdf_file("resume")]),
            ProfileAsset::Resume,
            MediaFolder::Resume,
            "Please upload a PDF file",
        )
        .await
        .unwrap();
        assert!(saved.resume.is_some());
    }
}
