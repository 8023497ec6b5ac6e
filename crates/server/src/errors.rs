use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::db::is_unique_violation;

/// A single rejected request field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(Vec<FieldError>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => f.write_str(msg),
            ApiError::Validation(errors) => {
                f.write_str("Validation failed")?;
                for error in errors {
                    write!(f, "; {}: {}", error.field, error.message)?;
                }
                Ok(())
            }
            ApiError::Internal(err) => write!(f, "{err:#}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            ApiError::Validation(errors) => ("Validation failed".to_string(), errors),
            ApiError::Internal(err) => {
                tracing::error!("request failed: {err:#}");
                ("Server Error".to_string(), Vec::new())
            }
            other => (other.to_string(), Vec::new()),
        };

        (
            status,
            Json(json!({
                "success": false,
                "message": message,
                "errors": errors,
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            let message = match &err {
                sqlx::Error::Database(db) => conflict_message(db.message()),
                _ => "Resource already exists".to_string(),
            };
            return ApiError::Conflict(message);
        }

        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::BadRequest(message.into())
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    ApiError::NotFound(message.into())
}

pub fn unauthorized(message: impl Into<String>) -> ApiError {
    ApiError::Unauthorized(message.into())
}

pub fn internal_error(err: impl fmt::Display) -> ApiError {
    ApiError::Internal(anyhow::anyhow!(err.to_string()))
}

/// Turns `UNIQUE constraint failed: projects.slug` into `Slug already exists`.
fn conflict_message(db_message: &str) -> String {
    let column = db_message
        .rsplit_once(": ")
        .map(|(_, columns)| columns)
        .and_then(|columns| columns.split(',').next())
        .and_then(|qualified| qualified.trim().rsplit('.').next())
        .filter(|column| !column.is_empty());

    match column {
        Some(column) => {
            let mut chars = column.chars();
            let capitalized: String = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            format!("{capitalized} already exists")
        }
        None => "Resource already exists".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_from_sqlite() {
        assert_eq!(
            conflict_message("UNIQUE constraint failed: projects.slug"),
            "Slug already exists"
        );
        assert_eq!(
            conflict_message("UNIQUE constraint failed: users.email"),
            "Email already exists"
        );
        assert_eq!(conflict_message("weird"), "Resource already exists");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Validation(vec![FieldError::new("title", "required")]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            internal_error("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_display_lists_fields() {
        let err = ApiError::Validation(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("price", "Price must be a valid number >= 0"),
        ]);
        let text = err.to_string();
        assert!(text.contains("title: Title is required"));
        assert!(text.contains("price:"));
    }
}
