use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// A stored document: a JSON object carrying `_id` and `created_at` once read
/// back from a store.
pub type Document = serde_json::Map<String, Value>;

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";
/// Field holding the store-assigned creation timestamp (RFC 3339, UTC).
pub const CREATED_AT_FIELD: &str = "created_at";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("document store is not available: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Collection-oriented document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether a backing store was set up at startup.
    fn is_initialized(&self) -> bool {
        true
    }

    /// Inserts `record` into `collection` and returns its new identifier.
    async fn create_document(
        &self,
        collection: &str,
        record: Document,
    ) -> Result<String, StorageError>;

    /// Returns up to `limit` documents of `collection` containing every
    /// key/value pair of `filter`. An empty filter matches everything.
    async fn get_documents(
        &self,
        collection: &str,
        filter: &Document,
        limit: i64,
    ) -> Result<Vec<Document>, StorageError>;

    /// Names of collections holding at least one document.
    async fn list_collections(&self) -> Result<Vec<String>, StorageError>;
}

/// Serializes a value into a storable document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StorageError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Adds the store-assigned fields to a document read back from storage.
pub(crate) fn stamp(mut doc: Document, id: &str, created_at: DateTime<Utc>) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc.insert(
        CREATED_AT_FIELD.to_string(),
        Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    doc
}

/// PostgreSQL-backed document store. Every collection shares one JSONB table.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the documents table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id UUID PRIMARY KEY,
                collection TEXT NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS documents_collection_created_at_idx \
             ON documents (collection, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_document(
        &self,
        collection: &str,
        record: Document,
    ) -> Result<String, StorageError> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO documents (id, collection, data, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(collection)
        .bind(Json(Value::Object(record)))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Inserted document {} into '{}'", id, collection);
        Ok(id.to_string())
    }

    async fn get_documents(
        &self,
        collection: &str,
        filter: &Document,
        limit: i64,
    ) -> Result<Vec<Document>, StorageError> {
        // Newest first so that the limit keeps the most recent documents.
        let rows = sqlx::query_as::<_, (Uuid, Json<Value>, DateTime<Utc>)>(
            "SELECT id, data, created_at FROM documents \
             WHERE collection = $1 AND data @> $2 \
             ORDER BY created_at DESC \
             LIMIT $3",
        )
        .bind(collection)
        .bind(Json(Value::Object(filter.clone())))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data), created_at)| {
                let doc = match data {
                    Value::Object(map) => map,
                    other => {
                        let mut map = Document::new();
                        map.insert("value".to_string(), other);
                        map
                    }
                };
                stamp(doc, &id.to_string(), created_at)
            })
            .collect())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StorageError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT collection FROM documents ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}

/// Stand-in used when no store could be set up at startup. Every operation
/// fails with [`StorageError::Unavailable`].
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    fn is_initialized(&self) -> bool {
        false
    }

    async fn create_document(
        &self,
        _collection: &str,
        _record: Document,
    ) -> Result<String, StorageError> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    async fn get_documents(
        &self,
        _collection: &str,
        _filter: &Document,
        _limit: i64,
    ) -> Result<Vec<Document>, StorageError> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    async fn list_collections(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_document_requires_object() {
        assert!(to_document(&json!({"name": "Ada"})).is_ok());
        let err = to_document(&json!(["Ada"])).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
    }

    #[test]
    fn test_stamp_adds_store_fields() {
        let doc = to_document(&json!({"name": "Ada"})).unwrap();
        let stamped = stamp(doc, "abc", Utc::now());
        assert_eq!(stamped[ID_FIELD], "abc");
        let created = stamped[CREATED_AT_FIELD].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = UnavailableStore::new("DATABASE_URL is not set");
        assert!(!store.is_initialized());
        assert!(matches!(
            store.create_document("lead", Document::new()).await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(store
            .get_documents("lead", &Document::new(), 10)
            .await
            .is_err());
        assert!(store.list_collections().await.is_err());
    }
}
