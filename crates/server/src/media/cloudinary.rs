//! Cloudinary-backed media store using the signed upload REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Digest;

use super::{MediaAsset, MediaFolder, MediaStore, UploadedFile};
use crate::config::CloudinaryCredentials;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Incoming transformation applied to every upload: fit within 1200x800,
/// automatic quality and format.
pub const UPLOAD_TRANSFORMATION: &str = "c_limit,h_800,w_1200/q_auto/f_auto";

pub struct CloudinaryStore {
    http: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(http: reqwest::Client, credentials: CloudinaryCredentials) -> Self {
        Self {
            http,
            credentials,
            api_base: API_BASE.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.api_base, self.credentials.cloud_name, path)
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.credentials.api_secret)
    }
}

/// Cloudinary request signature: the parameters sorted by name, joined as
/// `k=v&k=v`, with the API secret appended, hashed with SHA-1.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = sha1::Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, file: &UploadedFile, folder: MediaFolder) -> Result<MediaAsset> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", folder.as_str()),
            ("timestamp", &timestamp),
            ("transformation", UPLOAD_TRANSFORMATION),
        ]);

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .context("invalid upload content type")?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.as_str())
            .text("transformation", UPLOAD_TRANSFORMATION)
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("auto/upload"))
            .multipart(form)
            .send()
            .await
            .context("Image upload failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Image upload failed: {status}: {body}");
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .context("Image upload failed: unexpected response")?;

        Ok(MediaAsset {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let params = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.credentials.api_key.as_str()),
            ("signature", signature.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint("image/destroy"))
            .form(&params)
            .send()
            .await
            .context("Image deletion failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Image deletion failed: {status}");
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .context("Image deletion failed: unexpected response")?;
        if destroyed.result != "ok" && destroyed.result != "not found" {
            anyhow::bail!("Image deletion failed: {}", destroyed.result);
        }
        Ok(())
    }
}
