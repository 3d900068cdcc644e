use crate::config::Config;
use crate::db_storage::{to_document, Document, DocumentStore, CREATED_AT_FIELD, ID_FIELD};
use crate::errors::AppError;
use crate::models::*;
use crate::notifications::{notify_new_lead, Notifier};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Header carrying the admin secret for `GET /api/leads`.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Document store, opened once at startup.
    pub store: Arc<dyn DocumentStore>,
    /// Outbound email channel.
    pub notifier: Arc<dyn Notifier>,
}

/// GET /
#[utoipa::path(get, path = "/", responses((status = 200, body = MessageResponse)))]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Media Buying Course Lead API".to_string(),
    })
}

/// GET /api/hello
#[utoipa::path(get, path = "/api/hello", responses((status = 200, body = MessageResponse)))]
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the backend API!".to_string(),
    })
}

/// GET /test
///
/// Reports backend and document store status. Store errors are folded into
/// the status strings; this endpoint always answers 200.
#[utoipa::path(get, path = "/test", responses((status = 200, body = Diagnostics)))]
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> Json<Diagnostics> {
    let mut report = Diagnostics {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: set_or_not(state.config.database_url.is_some()),
        database_name: set_or_not(state.config.database_name.is_some()),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    if state.store.is_initialized() {
        report.database = "✅ Available".to_string();
        report.connection_status = "Connected".to_string();

        match state.store.list_collections().await {
            Ok(collections) => {
                report.collections = collections.into_iter().take(10).collect();
                report.database = "✅ Connected & Working".to_string();
            }
            Err(e) => {
                report.database =
                    format!("⚠️  Connected but Error: {}", truncate(&e.to_string(), 50));
            }
        }
    }

    Json(report)
}

fn set_or_not(present: bool) -> String {
    let status = if present { "✅ Set" } else { "❌ Not Set" };
    status.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// POST /api/leads
///
/// Validates and stores a lead, then sends the admin summary and the
/// applicant confirmation when mail is configured. Email outcomes never
/// affect the response.
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = LeadPayload,
    responses(
        (status = 201, body = LeadCreated),
        (status = 400, body = ErrorBody),
        (status = 413, body = ErrorBody),
        (status = 422, body = ErrorBody),
        (status = 500, body = ErrorBody),
    )
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<LeadCreated>), AppError> {
    let Json(body) = body.map_err(reject_body)?;
    let payload: LeadPayload = serde_path_to_error::deserialize(body)?;
    let lead = payload.into_lead()?;

    let id = state
        .store
        .create_document(LEAD_COLLECTION, to_document(&lead)?)
        .await?;
    tracing::info!("✓ Lead stored: id={}", id);

    if let Some(report) = notify_new_lead(state.notifier.as_ref(), &lead, &id).await {
        tracing::debug!(
            "Lead {} notifications: admin={:?}, applicant={:?}",
            id,
            report.admin,
            report.applicant
        );
    }

    Ok((StatusCode::CREATED, Json(LeadCreated { ok: true, id })))
}

/// Oversized bodies keep their 413; any other unreadable body is a 400.
fn reject_body(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
        _ => AppError::BadRequest(rejection.body_text()),
    }
}

/// GET /api/leads
///
/// Lists stored leads, newest first. Requires `X-Admin-Key` when `ADMIN_KEY`
/// is configured.
#[utoipa::path(
    get,
    path = "/api/leads",
    params(
        ListLeadsQuery,
        ("X-Admin-Key" = Option<String>, Header, description = "Admin secret, required when ADMIN_KEY is set"),
    ),
    responses(
        (status = 200, body = LeadsPage),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 500, body = ErrorBody),
    )
)]
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ListLeadsQuery>, QueryRejection>,
) -> Result<Json<LeadsPage>, AppError> {
    authorize_admin(&state.config, &headers)?;

    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 1 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }

    let docs = state
        .store
        .get_documents(LEAD_COLLECTION, &Document::new(), limit)
        .await?;

    let mut results: Vec<Document> = docs.into_iter().map(expose_id).collect();
    sort_newest_first(&mut results);

    Ok(Json(LeadsPage { ok: true, results }))
}

/// Checks the admin header against `ADMIN_KEY`. With no key configured the
/// check is skipped (a warning is logged at startup).
fn authorize_admin(config: &Config, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(ref expected) = config.admin_key else {
        return Ok(());
    };

    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Admin-Key header".to_string()))?;

    if !constant_time_compare(provided, expected) {
        return Err(AppError::Unauthorized("Invalid admin key".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Renames the store's `_id` to a public `id` string.
pub fn expose_id(mut doc: Document) -> Document {
    if let Some(id) = doc.remove(ID_FIELD) {
        let id = match id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        doc.insert("id".to_string(), Value::String(id));
    }
    doc
}

fn created_at(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get(CREATED_AT_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Sorts by `created_at` descending. Documents without a readable timestamp
/// go last, keeping their relative order.
pub fn sort_newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        to_document(&value).unwrap()
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret", "secret"));
        assert!(!constant_time_compare("secret", "secreT"));
        assert!(!constant_time_compare("secret", "secret2"));
    }

    #[test]
    fn test_expose_id_renames_field() {
        let out = expose_id(doc(json!({"_id": "abc", "name": "Ada"})));
        assert_eq!(out["id"], "abc");
        assert!(!out.contains_key("_id"));
    }

    #[test]
    fn test_sort_newest_first_with_missing_timestamps() {
        let mut docs = vec![
            doc(json!({"n": 1, "created_at": "2024-01-01T00:00:00Z"})),
            doc(json!({"n": 2})),
            doc(json!({"n": 3, "created_at": "2024-03-01T00:00:00Z"})),
            doc(json!({"n": 4, "created_at": "garbage"})),
            doc(json!({"n": 5, "created_at": "2024-02-01T00:00:00+02:00"})),
        ];
        sort_newest_first(&mut docs);
        let order: Vec<i64> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![3, 5, 1, 2, 4]);
    }

    #[test]
    fn test_authorize_admin() {
        let mut config = Config {
            database_url: None,
            database_name: None,
            port: 8000,
            admin_key: None,
            mail: None,
        };
        let mut headers = HeaderMap::new();
        assert!(authorize_admin(&config, &headers).is_ok());

        config.admin_key = Some("s3cret".to_string());
        assert!(authorize_admin(&config, &headers).is_err());

        headers.insert(ADMIN_KEY_HEADER, "wrong".parse().unwrap());
        assert!(authorize_admin(&config, &headers).is_err());

        headers.insert(ADMIN_KEY_HEADER, "s3cret".parse().unwrap());
        assert!(authorize_admin(&config, &headers).is_ok());
    }
}
