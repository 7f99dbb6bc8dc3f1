//! Namespace manager.

use crate::collection::Collection;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::journal::CollectionTables;
use crate::query::{FieldEvaluator, QueryEvaluator};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tidemark_storage::{FileAdapter, MemoryAdapter, StoreAdapter, TableRef, WriteBatch};

/// Reserved collection holding namespace bookkeeping tables.
const SYSTEM_COLLECTION: &str = "__system";
/// Table registering collection names.
const MANIFEST_TABLE: &str = "collections";
/// Table holding the namespace identity marker.
const META_TABLE: &str = "meta";
const NAMESPACE_KEY: &str = "name";

/// A handle onto one durable namespace.
///
/// A namespace is a named container of collections whose identity
/// persists across process restarts. Opening never takes an exclusive
/// lock: any number of handles may be open on the same namespace
/// concurrently, and because every handle reads and writes through the
/// shared adapter, a write completed through one handle is visible to
/// all of them.
///
/// # Opening
///
/// ```rust,ignore
/// // Ephemeral, for tests:
/// let db = Database::open_in_memory("app").await?;
///
/// // Durable, on disk:
/// let db = Database::open_on_disk(Path::new("data"), Config::new("app")).await?;
///
/// // Or bring your own adapter:
/// let db = Database::open(adapter, Config::new("app")).await?;
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    namespace: String,
    adapter: Arc<dyn StoreAdapter>,
    evaluator: Arc<dyn QueryEvaluator>,
    /// Collections already attached to this handle, by name. Shared so
    /// that repeated lookups return the same write lock.
    collections: RwLock<HashMap<String, Collection>>,
}

impl Database {
    /// Opens or creates the namespace named by `config` on the given
    /// adapter, with the default field-equality query evaluator.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is unusable or the
    /// adapter fails.
    pub async fn open(adapter: Arc<dyn StoreAdapter>, config: Config) -> CoreResult<Self> {
        Self::open_with_evaluator(adapter, config, Arc::new(FieldEvaluator)).await
    }

    /// Opens a namespace with a caller-provided query evaluator.
    ///
    /// The evaluator interprets every predicate passed to
    /// [`Collection::find`](crate::Collection::find).
    pub async fn open_with_evaluator(
        adapter: Arc<dyn StoreAdapter>,
        config: Config,
        evaluator: Arc<dyn QueryEvaluator>,
    ) -> CoreResult<Self> {
        validate_name("namespace", &config.namespace)?;

        let meta = TableRef::new(&config.namespace, SYSTEM_COLLECTION, META_TABLE);
        if adapter.get(meta, NAMESPACE_KEY)?.is_none() {
            // First open: persist the namespace identity marker.
            let mut batch = WriteBatch::new();
            batch.put(meta, NAMESPACE_KEY, config.namespace.clone().into_bytes());
            adapter.apply(&batch)?;
        }

        tracing::debug!(namespace = %config.namespace, "opened namespace");
        Ok(Self {
            inner: Arc::new(DatabaseInner {
                namespace: config.namespace,
                adapter,
                evaluator,
                collections: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Opens an ephemeral in-memory namespace.
    ///
    /// To model several handles on one namespace, open with
    /// [`Database::open`] on clones of a shared [`MemoryAdapter`].
    pub async fn open_in_memory(namespace: impl Into<String>) -> CoreResult<Self> {
        Self::open(Arc::new(MemoryAdapter::new()), Config::new(namespace)).await
    }

    /// Opens a durable namespace stored under `root`.
    pub async fn open_on_disk(root: &Path, config: Config) -> CoreResult<Self> {
        let adapter = FileAdapter::open_with_sync(root, config.sync_on_commit)?;
        Self::open(Arc::new(adapter), config).await
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Attaches a collection, creating its storage if absent.
    ///
    /// Idempotent: attaching an existing collection returns a handle to
    /// the same durable state, and repeated calls through one database
    /// handle share one write lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unusable or the adapter fails.
    pub async fn collection(&self, name: &str) -> CoreResult<Collection> {
        validate_name("collection", name)?;

        if let Some(existing) = self.inner.collections.read().get(name) {
            return Ok(existing.clone());
        }

        let manifest = self.manifest_table();
        if self.inner.adapter.get(manifest, name)?.is_none() {
            let mut batch = WriteBatch::new();
            batch.put(manifest, name, Vec::new());
            self.inner.adapter.apply(&batch)?;
            tracing::debug!(namespace = %self.inner.namespace, collection = name, "created collection");
        }

        let collection = Collection::new(
            CollectionTables::new(self.inner.namespace.clone(), name),
            Arc::clone(&self.inner.adapter),
            Arc::clone(&self.inner.evaluator),
        );
        self.inner
            .collections
            .write()
            .entry(name.to_string())
            .or_insert_with(|| collection.clone());
        Ok(collection)
    }

    /// Deletes a collection: live documents, base snapshots and journal
    /// entries. Idempotent when the collection does not exist.
    pub async fn remove_collection(&self, name: &str) -> CoreResult<()> {
        validate_name("collection", name)?;

        self.inner.collections.write().remove(name);
        self.inner
            .adapter
            .drop_collection(&self.inner.namespace, name)?;

        let mut batch = WriteBatch::new();
        batch.delete(self.manifest_table(), name);
        self.inner.adapter.apply(&batch)?;

        tracing::debug!(namespace = %self.inner.namespace, collection = name, "removed collection");
        Ok(())
    }

    /// Lists the collections registered in this namespace, sorted.
    pub async fn collection_names(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .inner
            .adapter
            .scan(self.manifest_table())?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn manifest_table(&self) -> TableRef<'_> {
        TableRef::new(&self.inner.namespace, SYSTEM_COLLECTION, MANIFEST_TABLE)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("namespace", &self.inner.namespace)
            .finish_non_exhaustive()
    }
}

/// Namespace and collection names become directory names and table
/// keys, so path separators and the system prefix are off limits.
fn validate_name(kind: &str, name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(format!("{kind} name is empty")));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(CoreError::invalid_name(format!(
            "{kind} name {name:?} contains path components"
        )));
    }
    if name.starts_with("__") {
        return Err(CoreError::invalid_name(format!(
            "{kind} name {name:?} uses the reserved prefix"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use tidemark_codec::Document;

    fn doc(id: &str, a: &str) -> Document {
        Document::new(id).with("a", a)
    }

    #[tokio::test]
    async fn open_in_memory() {
        let db = Database::open_in_memory("app").await.unwrap();
        assert_eq!(db.namespace(), "app");
    }

    #[tokio::test]
    async fn writes_visible_through_second_handle() {
        let adapter = Arc::new(MemoryAdapter::new());
        let db_a = Database::open(adapter.clone(), Config::new("db.scratch"))
            .await
            .unwrap();

        let col_a = db_a.collection("scratch").await.unwrap();
        col_a.upsert(doc("1", "Alice")).await.unwrap();

        // A fresh handle on the same namespace observes the document
        let db_b = Database::open(adapter, Config::new("db.scratch"))
            .await
            .unwrap();
        let col_b = db_b.collection("scratch").await.unwrap();

        let results = col_b.find(Query::all()).fetch().await.unwrap();
        assert_eq!(results, vec![doc("1", "Alice")]);
    }

    #[tokio::test]
    async fn journal_visible_through_second_handle() {
        let adapter = Arc::new(MemoryAdapter::new());
        let db_a = Database::open(adapter.clone(), Config::new("db.scratch"))
            .await
            .unwrap();
        let col_a = db_a.collection("scratch").await.unwrap();

        col_a.cache_one(doc("1", "Alice")).await.unwrap();
        col_a.upsert(doc("1", "Bob")).await.unwrap();

        let db_b = Database::open(adapter, Config::new("db.scratch"))
            .await
            .unwrap();
        let col_b = db_b.collection("scratch").await.unwrap();

        let upserts = col_b.pending_upserts().await.unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].doc, doc("1", "Bob"));
        assert_eq!(upserts[0].base, Some(doc("1", "Alice")));
    }

    #[tokio::test]
    async fn collection_is_idempotent() {
        let db = Database::open_in_memory("app").await.unwrap();

        let first = db.collection("notes").await.unwrap();
        first.upsert(doc("1", "Alice")).await.unwrap();

        let second = db.collection("notes").await.unwrap();
        assert_eq!(second.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_collection_clears_everything() {
        let db = Database::open_in_memory("app").await.unwrap();
        let col = db.collection("notes").await.unwrap();

        col.cache_one(doc("1", "Alice")).await.unwrap();
        col.upsert(doc("1", "Bob")).await.unwrap();
        col.remove("2").await.unwrap();

        db.remove_collection("notes").await.unwrap();

        let col = db.collection("notes").await.unwrap();
        assert_eq!(col.count().await.unwrap(), 0);
        assert!(col.pending_upserts().await.unwrap().is_empty());
        assert!(col.pending_removes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_missing_collection_is_a_no_op() {
        let db = Database::open_in_memory("app").await.unwrap();
        db.remove_collection("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn collection_names_are_listed_sorted() {
        let db = Database::open_in_memory("app").await.unwrap();
        db.collection("notes").await.unwrap();
        db.collection("albums").await.unwrap();

        assert_eq!(
            db.collection_names().await.unwrap(),
            vec!["albums".to_string(), "notes".to_string()]
        );
    }

    #[tokio::test]
    async fn removed_collections_leave_the_manifest() {
        let db = Database::open_in_memory("app").await.unwrap();
        db.collection("notes").await.unwrap();
        db.remove_collection("notes").await.unwrap();

        assert!(db.collection_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_names_rejected() {
        let db = Database::open_in_memory("app").await.unwrap();

        assert!(db.collection("").await.is_err());
        assert!(db.collection("a/b").await.is_err());
        assert!(db.collection("..").await.is_err());
        assert!(db.collection("__system").await.is_err());

        let result = Database::open_in_memory("a/b").await;
        assert!(matches!(result, Err(CoreError::InvalidName { .. })));
    }
}
