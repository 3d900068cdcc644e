use std::env;
use uuid::Uuid;

use lead_capture_api::db::Database;
use lead_capture_api::db_storage::{to_document, DocumentStore, PgDocumentStore, ID_FIELD};

/// Integration smoke test for the PostgreSQL document store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn pg_document_store_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, None).await?;
    let store = PgDocumentStore::new(db.pool.clone());
    store.ensure_schema().await?;

    // Unique collection so repeated runs do not see each other's rows.
    let collection = format!("smoke_{}", Uuid::new_v4().simple());

    let first = store
        .create_document(
            &collection,
            to_document(&serde_json::json!({"name": "Ada", "email": "ada@example.com"}))?,
        )
        .await?;
    let second = store
        .create_document(
            &collection,
            to_document(&serde_json::json!({"name": "Grace", "email": "grace@example.com"}))?,
        )
        .await?;
    assert_ne!(first, second);

    let all = store
        .get_documents(&collection, &Default::default(), 50)
        .await?;
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|d| d.contains_key(ID_FIELD)));

    let filter = to_document(&serde_json::json!({"name": "Grace"}))?;
    let graces = store.get_documents(&collection, &filter, 50).await?;
    assert_eq!(graces.len(), 1);
    assert_eq!(graces[0][ID_FIELD], serde_json::json!(second));

    assert!(store.list_collections().await?.contains(&collection));

    sqlx::query("DELETE FROM documents WHERE collection = $1")
        .bind(&collection)
        .execute(&db.pool)
        .await?;

    Ok(())
}
