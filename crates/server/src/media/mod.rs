//! Uploaded media: the storage capability and the upload policy.

pub mod cloudinary;
pub mod local;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::config::MediaConfig;
use crate::errors::{ApiError, ApiResult};

pub use cloudinary::CloudinaryStore;
pub use local::LocalStore;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_IMAGES: usize = 5;

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp", "svg"];

/// A stored asset as referenced from documents. Assets linked by URL only
/// (seed data, external images) have an empty `public_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    #[serde(default)]
    pub public_id: String,
    pub url: String,
}

/// A file received in a multipart request.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaFolder {
    Projects,
    SaleProjects,
    About,
    Resume,
    Avatars,
}

impl MediaFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaFolder::Projects => "portfolio/projects",
            MediaFolder::SaleProjects => "portfolio/sale-projects",
            MediaFolder::About => "portfolio/about",
            MediaFolder::Resume => "portfolio/resume",
            MediaFolder::Avatars => "portfolio/avatars",
        }
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file: &UploadedFile, folder: MediaFolder) -> Result<MediaAsset>;

    async fn delete(&self, public_id: &str) -> Result<()>;
}

pub type SharedMediaStore = Arc<dyn MediaStore>;

/// Build the store selected by configuration.
pub fn from_config(config: &MediaConfig, http: reqwest::Client) -> Result<SharedMediaStore> {
    match config {
        MediaConfig::Local { root, public_base } => {
            let root = crate::db::normalize_path(root)?;
            Ok(Arc::new(LocalStore::new(root, public_base.clone())))
        }
        MediaConfig::Cloudinary { .. } => {
            let credentials = config
                .resolve_cloudinary()?
                .ok_or_else(|| anyhow::anyhow!("cloudinary credentials missing"))?;
            Ok(Arc::new(CloudinaryStore::new(http, credentials)))
        }
    }
}

pub fn check_image(file: &UploadedFile) -> ApiResult<()> {
    let ext_ok = file
        .extension()
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
    let mime = file.content_type.to_ascii_lowercase();
    let mime_ok = mime.starts_with("image/")
        && IMAGE_EXTENSIONS.iter().any(|kind| mime.contains(kind));

    if !(ext_ok && mime_ok) {
        return Err(ApiError::BadRequest(
            "Only image files are allowed (jpeg, jpg, png, gif, webp, svg)".to_string(),
        ));
    }
    if file.bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::BadRequest("File size too large".to_string()));
    }
    Ok(())
}

pub fn check_images(files: &[UploadedFile]) -> ApiResult<()> {
    if files.len() > MAX_IMAGES {
        return Err(ApiError::BadRequest("Too many files".to_string()));
    }
    files.iter().try_for_each(check_image)
}

pub fn check_pdf(file: &UploadedFile) -> ApiResult<()> {
    if file.content_type.to_ascii_lowercase() != "application/pdf" {
        return Err(ApiError::BadRequest("Only PDF files are allowed".to_string()));
    }
    if file.bytes.len() > MAX_PDF_BYTES {
        return Err(ApiError::BadRequest("File size too large".to_string()));
    }
    Ok(())
}

pub async fn upload(
    store: &dyn MediaStore,
    file: &UploadedFile,
    folder: MediaFolder,
) -> Result<MediaAsset> {
    let start = Instant::now();
    let result = store.upload(file, folder).await;
    let outcome = if result.is_ok() { "ok" } else { "error" };
    counter!("media.uploads", "outcome" => outcome).increment(1);
    histogram!("media.upload_ms").record(start.elapsed().as_millis() as f64);

    match &result {
        Ok(asset) => tracing::debug!(public_id = %asset.public_id, "stored {}", file.file_name),
        Err(err) => tracing::warn!(folder = folder.as_str(), "upload failed: {err:#}"),
    }
    result
}

/// Upload every file, removing the ones already stored if a later one fails.
pub async fn upload_all(
    store: &dyn MediaStore,
    files: &[UploadedFile],
    folder: MediaFolder,
) -> Result<Vec<MediaAsset>> {
    let mut assets = Vec::with_capacity(files.len());
    for file in files {
        match upload(store, file, folder).await {
            Ok(asset) => assets.push(asset),
            Err(err) => {
                discard(store, &assets).await;
                return Err(err);
            }
        }
    }
    Ok(assets)
}

/// Best-effort removal; failures are logged and otherwise ignored.
pub async fn discard<'a, I>(store: &dyn MediaStore, assets: I)
where
    I: IntoIterator<Item = &'a MediaAsset>,
{
    for asset in assets.into_iter().filter(|asset| !asset.public_id.is_empty()) {
        if let Err(err) = store.delete(&asset.public_id).await {
            tracing::warn!(public_id = %asset.public_id, "failed to delete media: {err:#}");
        }
    }
}

/// Assets referenced by `before` that `after` no longer references.
pub fn orphaned(before: &[&MediaAsset], after: &[&MediaAsset]) -> Vec<MediaAsset> {
    before
        .iter()
        .filter(|asset| !after.contains(*asset))
        .map(|asset| (*asset).clone())
        .collect()
}
