use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db_storage::{stamp, Document, DocumentStore, StorageError};

/// In-process document store. Documents live only as long as the process and
/// are returned newest first, so a limit keeps the most recent ones.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.get(key) == Some(expected))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_document(
        &self,
        collection: &str,
        record: Document,
    ) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        let doc = stamp(record, &id, Utc::now());

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);

        Ok(id)
    }

    async fn get_documents(
        &self,
        collection: &str,
        filter: &Document,
        limit: i64,
    ) -> Result<Vec<Document>, StorageError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let guard = self.collections.read().await;

        Ok(guard
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .rev()
                    .filter(|doc| matches(doc, filter))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .collections
            .read()
            .await
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_storage::{to_document, ID_FIELD};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let store = MemoryDocumentStore::new();
        let id = store
            .create_document("lead", to_document(&json!({"name": "Ada"})).unwrap())
            .await
            .unwrap();

        let docs = store
            .get_documents("lead", &Document::new(), 10)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0][ID_FIELD], json!(id));
        assert_eq!(docs[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_filter_and_limit() {
        let store = MemoryDocumentStore::new();
        for name in ["Ada", "Grace", "Ada"] {
            store
                .create_document("lead", to_document(&json!({"name": name})).unwrap())
                .await
                .unwrap();
        }

        let filter = to_document(&json!({"name": "Ada"})).unwrap();
        let adas = store.get_documents("lead", &filter, 50).await.unwrap();
        assert_eq!(adas.len(), 2);

        let limited = store
            .get_documents("lead", &Document::new(), 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_limit_keeps_most_recent() {
        let store = MemoryDocumentStore::new();
        for name in ["First", "Second", "Third"] {
            store
                .create_document("lead", to_document(&json!({"name": name})).unwrap())
                .await
                .unwrap();
        }

        let names: Vec<Value> = store
            .get_documents("lead", &Document::new(), 2)
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("Third"), json!("Second")]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryDocumentStore::new();
        store
            .create_document("lead", Document::new())
            .await
            .unwrap();

        assert_eq!(store.count("lead").await, 1);
        assert_eq!(store.count("user").await, 0);
        assert!(store
            .get_documents("user", &Document::new(), 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.list_collections().await.unwrap(), vec!["lead"]);
    }
}
