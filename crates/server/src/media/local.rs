//! Filesystem media store. Files are written under `root/<folder>/` and
//! served by the API router at `/media`.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{MediaAsset, MediaFolder, MediaStore, UploadedFile};

pub struct LocalStore {
    root: PathBuf,
    public_base: String,
}

impl LocalStore {
    pub fn new(root: PathBuf, public_base: String) -> Self {
        Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, public_id: &str) -> Result<PathBuf> {
        let relative = Path::new(public_id);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || public_id.is_empty() {
            anyhow::bail!("invalid media id: {public_id}");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalStore {
    async fn upload(&self, file: &UploadedFile, folder: MediaFolder) -> Result<MediaAsset> {
        let ext = file
            .extension()
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "bin".to_string());
        let public_id = format!("{}/{}.{}", folder.as_str(), cuid2::create_id(), ext);

        let path = self.resolve(&public_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create media dir: {}", parent.display()))?;
        }
        tokio::fs::write(&path, &file.bytes)
            .await
            .with_context(|| format!("failed to write media file: {}", path.display()))?;

        Ok(MediaAsset {
            url: format!("{}/{}", self.public_base, public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let path = self.resolve(public_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to delete media file: {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::image_file;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_then_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().to_path_buf(), "/media/".to_string());

        let asset = store
            .upload(&image_file("thumbnail"), MediaFolder::Projects)
            .await
            .unwrap();
        assert!(asset.public_id.starts_with("portfolio/projects/"));
        assert!(asset.public_id.ends_with(".png"));
        assert_eq!(asset.url, format!("/media/{}", asset.public_id));

        let path = temp_dir.path().join(&asset.public_id);
        assert!(path.exists());

        store.delete(&asset.public_id).await.unwrap();
        assert!(!path.exists());

        // Deleting twice is not an error.
        store.delete(&asset.public_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().to_path_buf(), "/media".to_string());

        assert!(store.delete("../outside.png").await.is_err());
        assert!(store.delete("/etc/passwd").await.is_err());
        assert!(store.delete("").await.is_err());
    }
}
