//! Request body extractor accepting JSON, url-encoded and multipart bodies.

use axum::Form;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde_json::{Map, Value};

use crate::errors::{ApiError, bad_request};
use crate::media::UploadedFile;
use crate::validation::payload::Payload;

/// A parsed request body: scalar fields plus any uploaded files.
///
/// Repeated keys are collected into arrays and a trailing `[]` on a key is
/// dropped, so `images[]` and `images` name the same field.
#[derive(Debug, Default)]
pub struct FormData {
    pub payload: Payload,
    files: Vec<UploadedFile>,
}

impl FormData {
    pub fn new(payload: Payload, files: Vec<UploadedFile>) -> Self {
        Self { payload, files }
    }

    pub fn has_file(&self, field: &str) -> bool {
        self.files.iter().any(|file| file.field == field)
    }

    /// Removes and returns the first file sent under `field`.
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|file| file.field == field)?;
        Some(self.files.remove(index))
    }

    /// Removes and returns every file sent under `field`.
    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|file| file.field == field);
        self.files = rest;
        taken
    }
}

impl<S: Send + Sync> FromRequest<S> for FormData {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            read_multipart(req, state).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| bad_request(rejection.body_text()))?;
            let mut fields = Map::new();
            for (key, value) in pairs {
                push_field(&mut fields, &key, Value::String(value));
            }
            Ok(FormData::new(Payload::new(fields), Vec::new()))
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| bad_request(rejection.body_text()))?;
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(FormData::default());
            }
            let value: Value = serde_json::from_slice(&body)
                .map_err(|err| bad_request(format!("Malformed JSON body: {err}")))?;
            Ok(FormData::new(Payload::from_value(value)?, Vec::new()))
        }
    }
}

async fn read_multipart<S: Send + Sync>(req: Request, state: &S) -> Result<FormData, ApiError> {
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|rejection| bad_request(rejection.body_text()))?;

    let mut fields = Map::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(err.body_text()))?
    {
        let name = field
            .name()
            .unwrap_or_default()
            .trim_end_matches("[]")
            .to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| bad_request(err.body_text()))?;
                // Browsers send an empty part for an untouched file input.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes,
                });
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| bad_request(err.body_text()))?;
                push_field(&mut fields, &name, Value::String(text));
            }
        }
    }

    Ok(FormData::new(Payload::new(fields), files))
}

fn push_field(fields: &mut Map<String, Value>, key: &str, value: Value) {
    let key = key.trim_end_matches("[]");
    match fields.get_mut(key) {
        None => {
            fields.insert(key.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde_json::json;

    async fn extract(content_type: &str, body: impl Into<Body>) -> Result<FormData, ApiError> {
        let req = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap();
        FormData::from_request(req, &()).await
    }

    #[test]
    fn test_push_field_collects_repeats() {
        let mut fields = Map::new();
        push_field(&mut fields, "tags[]", json!("a"));
        push_field(&mut fields, "tags", json!("b"));
        push_field(&mut fields, "tags", json!("c"));
        push_field(&mut fields, "title", json!("x"));
        assert_eq!(fields["tags"], json!(["a", "b", "c"]));
        assert_eq!(fields["title"], json!("x"));
    }

    #[tokio::test]
    async fn test_json_body() {
        let form = extract("application/json", r#"{"title": "Hello", "featured": true}"#)
            .await
            .unwrap();
        assert_eq!(form.payload.text("title").as_deref(), Some("Hello"));
        assert_eq!(form.payload.flag("featured"), Ok(Some(true)));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_payload() {
        let form = extract("application/json", "").await.unwrap();
        assert!(!form.payload.contains("title"));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let err = extract("application/json", "{nope").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_urlencoded_body() {
        let form = extract(
            "application/x-www-form-urlencoded",
            "name=Jane&ids=a&ids=b&order=3",
        )
        .await
        .unwrap();
        assert_eq!(form.payload.text("name").as_deref(), Some("Jane"));
        assert_eq!(form.payload.ids("ids"), vec!["a", "b"]);
        assert_eq!(form.payload.integer("order"), Ok(Some(3)));
    }

    #[tokio::test]
    async fn test_multipart_body() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nMy Project\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"thumbnail\"; filename=\"t.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"images[]\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nA\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"images[]\"; filename=\"b.png\"\r\nContent-Type: image/png\r\n\r\nB\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let mut form = extract(&format!("multipart/form-data; boundary={boundary}"), body)
            .await
            .unwrap();

        assert_eq!(form.payload.text("title").as_deref(), Some("My Project"));
        let thumbnail = form.take_file("thumbnail").unwrap();
        assert_eq!(thumbnail.file_name, "t.png");
        assert_eq!(thumbnail.content_type, "image/png");
        assert_eq!(&thumbnail.bytes[..], b"PNGDATA");

        let images = form.take_files("images");
        assert_eq!(images.len(), 2);
        assert!(form.take_file("thumbnail").is_none());
    }
}
