//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and
//! common seeded scenarios.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tidemark_core::{Config, Database, FileAdapter, MemoryAdapter, StoreAdapter};

/// Namespace used by all fixtures.
pub const TEST_NAMESPACE: &str = "db.scratch";

/// A test store with automatic cleanup.
///
/// Keeps the adapter (and temp directory, for file-backed stores) alive
/// so that [`TestStore::reopen`] can open further independent handles on
/// the same namespace.
pub struct TestStore {
    /// The primary database handle.
    pub db: Database,
    adapter: Arc<dyn StoreAdapter>,
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub async fn memory() -> Self {
        let adapter: Arc<dyn StoreAdapter> = Arc::new(MemoryAdapter::new());
        let db = Database::open(Arc::clone(&adapter), Config::new(TEST_NAMESPACE))
            .await
            .expect("Failed to open in-memory store");
        Self {
            db,
            adapter,
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store in a temp directory.
    pub async fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let adapter: Arc<dyn StoreAdapter> =
            Arc::new(FileAdapter::open(temp_dir.path()).expect("Failed to open file adapter"));
        let db = Database::open(Arc::clone(&adapter), Config::new(TEST_NAMESPACE))
            .await
            .expect("Failed to open file store");
        Self {
            db,
            adapter,
            temp_dir: Some(temp_dir),
        }
    }

    /// Opens an independent handle onto the same namespace.
    ///
    /// For file-backed stores this builds a fresh adapter on the same
    /// directory, exactly like a second process would.
    pub async fn reopen(&self) -> Database {
        let adapter: Arc<dyn StoreAdapter> = match &self.temp_dir {
            Some(dir) => {
                Arc::new(FileAdapter::open(dir.path()).expect("Failed to reopen file adapter"))
            }
            None => Arc::clone(&self.adapter),
        };
        Database::open(adapter, Config::new(TEST_NAMESPACE))
            .await
            .expect("Failed to reopen store")
    }

    /// Returns the shared adapter.
    pub fn adapter(&self) -> Arc<dyn StoreAdapter> {
        Arc::clone(&self.adapter)
    }

    /// Returns the store directory if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }
}

impl std::ops::Deref for TestStore {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test against a temporary in-memory store.
///
/// # Example
///
/// ```rust,ignore
/// use tidemark_testkit::with_store;
///
/// #[tokio::test]
/// async fn my_test() {
///     with_store(|db| async move {
///         let col = db.collection("test").await.unwrap();
///         // ... test operations
///     })
///     .await;
/// }
/// ```
pub async fn with_store<F, Fut, R>(f: F) -> R
where
    F: FnOnce(Database) -> Fut,
    Fut: Future<Output = R>,
{
    let store = TestStore::memory().await;
    f(store.db.clone()).await
}

/// Runs a test against a temporary file-backed store.
pub async fn with_file_store<F, Fut, R>(f: F) -> R
where
    F: FnOnce(Database) -> Fut,
    Fut: Future<Output = R>,
{
    let store = TestStore::file().await;
    f(store.db.clone()).await
}

/// Test scenario helpers.
pub mod scenarios {
    use tidemark_core::{Collection, Database, Document};

    /// A deterministic sample document.
    pub fn sample_doc(i: usize) -> Document {
        Document::new(format!("doc-{i:05}"))
            .with("lat", i as f64)
            .with("lng", (i + 1) as f64)
            .with("group", (i % 7) as i64)
    }

    /// Creates a collection pre-populated with `count` already-synced
    /// documents.
    pub async fn seeded_collection(db: &Database, name: &str, count: usize) -> Collection {
        let col = db.collection(name).await.expect("Failed to add collection");
        let docs = (0..count).map(sample_doc).collect();
        col.seed_many(docs).await.expect("Failed to seed documents");
        col
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_core::Query;

    #[tokio::test]
    async fn memory_store_works() {
        let store = TestStore::memory().await;
        assert_eq!(store.db.namespace(), TEST_NAMESPACE);
        assert!(store.path().is_none());
    }

    #[tokio::test]
    async fn file_store_has_a_path() {
        let store = TestStore::file().await;
        assert!(store.path().is_some());
    }

    #[tokio::test]
    async fn seeded_collection_is_populated_and_clean() {
        let store = TestStore::memory().await;
        let col = scenarios::seeded_collection(&store.db, "scratch", 25).await;

        assert_eq!(col.count().await.unwrap(), 25);
        assert!(col.pending_upserts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn with_store_helper() {
        let count = with_store(|db| async move {
            let col = db.collection("scratch").await.unwrap();
            col.upsert(scenarios::sample_doc(1)).await.unwrap();
            col.find(Query::all()).fetch().await.unwrap().len()
        })
        .await;
        assert_eq!(count, 1);
    }
}
