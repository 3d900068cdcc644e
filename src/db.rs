use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::Config;
use crate::db_storage::{DocumentStore, PgDocumentStore, UnavailableStore};
use crate::memory_storage::MemoryDocumentStore;

/// `DATABASE_URL` value selecting the in-process store.
pub const MEMORY_URL: &str = "memory://";

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Connects to PostgreSQL. `database_name`, when given, overrides the
    /// database named in the URL.
    pub async fn new(database_url: &str, database_name: Option<&str>) -> anyhow::Result<Self> {
        let mut options = PgConnectOptions::from_str(database_url)?;
        if let Some(name) = database_name {
            options = options.database(name);
        }

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}

/// Opens the document store described by `config`.
///
/// Never fails: a missing or unreachable store yields an [`UnavailableStore`]
/// so the process still starts and `/test` can report the problem.
pub async fn open_store(config: &Config) -> Arc<dyn DocumentStore> {
    let Some(ref url) = config.database_url else {
        tracing::warn!("⚠️  DATABASE_URL not set, document store disabled");
        return Arc::new(UnavailableStore::new("DATABASE_URL is not set"));
    };

    if url == MEMORY_URL {
        tracing::warn!("⚠️  Using in-memory document store, data will not survive restarts");
        return Arc::new(MemoryDocumentStore::new());
    }

    let db = match Database::new(url, config.database_name.as_deref()).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            return Arc::new(UnavailableStore::new(e.to_string()));
        }
    };

    let store = PgDocumentStore::new(db.pool);
    if let Err(e) = store.ensure_schema().await {
        tracing::error!("Failed to prepare documents table: {}", e);
        return Arc::new(UnavailableStore::new(e.to_string()));
    }

    tracing::info!("✓ Database connection pool established");
    Arc::new(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: Option<&str>) -> Config {
        Config {
            database_url: database_url.map(str::to_string),
            database_name: None,
            port: 8000,
            admin_key: None,
            mail: None,
        }
    }

    #[tokio::test]
    async fn test_missing_url_yields_unavailable_store() {
        let store = open_store(&config(None)).await;
        assert!(!store.is_initialized());
    }

    #[tokio::test]
    async fn test_memory_url_yields_working_store() {
        let store = open_store(&config(Some(MEMORY_URL))).await;
        assert!(store.is_initialized());
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_url_does_not_panic() {
        let store = open_store(&config(Some("not a database url"))).await;
        assert!(!store.is_initialized());
    }
}
