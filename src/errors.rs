use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;
use validator::ValidationErrors;

use crate::db_storage::StorageError;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Request body failed field validation.
    Validation(ValidationErrors),
    /// A body field has the wrong JSON type.
    InvalidField { field: String, message: String },
    /// Bad request error (malformed body or query).
    BadRequest(String),
    /// Request body exceeds the configured limit.
    PayloadTooLarge(String),
    /// Missing or incorrect admin credential.
    Unauthorized(String),
    /// Document store unavailable or rejected the operation.
    Storage(StorageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::InvalidField { field, message } => {
                write!(f, "Invalid field {}: {}", field, message)
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

/// Flattens validator output into `[{field, code, message}]`, sorted by field.
pub fn validation_detail(errors: &ValidationErrors) -> Value {
    let mut entries: Vec<(String, Value)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| describe(&field, &err.code));
                (
                    field.clone(),
                    json!({
                        "field": field,
                        "code": err.code,
                        "message": message,
                    }),
                )
            })
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Value::Array(entries.into_iter().map(|(_, v)| v).collect())
}

fn describe(field: &str, code: &str) -> String {
    match code {
        "required" => format!("{} is required", field),
        "length" => format!("{} has an invalid length", field),
        "email" => format!("{} must be a valid email address", field),
        other => format!("{} failed {} validation", field, other),
    }
}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and a `{detail}` JSON body.
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::Validation(errors) => {
                tracing::debug!("Validation failed: {}", errors);
                (StatusCode::UNPROCESSABLE_ENTITY, validation_detail(errors))
            }
            AppError::InvalidField { field, message } => {
                tracing::debug!("Invalid field {}: {}", field, message);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!([{ "field": field, "code": "type", "message": message }]),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, json!(msg)),
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (StatusCode::UNAUTHORIZED, json!("Unauthorized"))
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!(e.to_string()))
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for AppError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        // An empty path renders as "."; the whole body had the wrong shape.
        let field = match err.path().to_string() {
            path if path == "." => "body".to_string(),
            path => path,
        };
        AppError::InvalidField {
            field,
            message: err.into_inner().to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}
