//! Collection handle: CRUD, queries and journal reads.

use crate::error::CoreResult;
use crate::journal::{self, CollectionTables, JournalState, PendingUpsert, WriteOp};
use crate::query::{Query, QueryEvaluator};
use std::sync::Arc;
use tidemark_codec::Document;
use tidemark_storage::StoreAdapter;
use tokio::sync::Mutex;

/// A named set of documents within a namespace.
///
/// Handles are cheap to clone and share one write lock, so operations
/// issued through one database handle serialize per collection. Reads go
/// straight to the adapter - there is no handle-local cache - which is
/// what makes writes through one handle visible to every other handle on
/// the same namespace.
///
/// All operations are asynchronous and resolve exactly once, with a
/// value or an error.
///
/// # Example
///
/// ```rust,ignore
/// let db = Database::open_in_memory("app").await?;
/// let notes = db.collection("notes").await?;
///
/// notes.upsert(Document::new("1").with("text", "hello")).await?;
/// let all = notes.find(Query::all()).fetch().await?;
/// let unsynced = notes.pending_upserts().await?;
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    tables: CollectionTables,
    adapter: Arc<dyn StoreAdapter>,
    evaluator: Arc<dyn QueryEvaluator>,
    write_lock: Mutex<()>,
}

impl Collection {
    pub(crate) fn new(
        tables: CollectionTables,
        adapter: Arc<dyn StoreAdapter>,
        evaluator: Arc<dyn QueryEvaluator>,
    ) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                tables,
                adapter,
                evaluator,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.tables.collection
    }

    /// Returns the namespace this collection belongs to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.tables.namespace
    }

    /// Inserts or updates one document.
    ///
    /// A new id becomes live state plus a pending entry with no base; an
    /// edit of existing state freezes the current base snapshot into the
    /// entry on the first edit and only advances the entry's document on
    /// later ones.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingId`](crate::CoreError::MissingId) if
    /// the document has no string `id`, or a storage error; either way
    /// nothing is applied.
    pub async fn upsert(&self, doc: Document) -> CoreResult<()> {
        self.apply_ops(vec![WriteOp::Upsert(doc)]).await
    }

    /// Inserts or updates many documents as one atomic batch.
    ///
    /// The batch folds in call order, so the same id may appear more
    /// than once and compounds exactly like separate calls. One adapter
    /// round trip regardless of size; no partial application is ever
    /// observable, and any document without an id fails the whole batch.
    pub async fn upsert_many(&self, docs: Vec<Document>) -> CoreResult<()> {
        self.apply_ops(docs.into_iter().map(WriteOp::Upsert).collect())
            .await
    }

    /// Writes a document as already-synced baseline state.
    ///
    /// Sets live state and the base snapshot, clears any journal state
    /// for the id, and creates no pending entry. Used to bootstrap from
    /// a remote fetch.
    pub async fn seed(&self, doc: Document) -> CoreResult<()> {
        self.apply_ops(vec![WriteOp::Seed(doc)]).await
    }

    /// Bulk form of [`Collection::seed`]; one atomic batch.
    pub async fn seed_many(&self, docs: Vec<Document>) -> CoreResult<()> {
        self.apply_ops(docs.into_iter().map(WriteOp::Seed).collect())
            .await
    }

    /// Refreshes the base snapshot for `doc`'s id.
    ///
    /// Touches neither live state nor the journal.
    pub async fn cache_one(&self, doc: Document) -> CoreResult<()> {
        self.apply_ops(vec![WriteOp::CacheOne(doc)]).await
    }

    /// Removes a document from the live set and marks it for sync.
    ///
    /// Idempotent: removing an absent or already-removed id succeeds and
    /// leaves the id in the pending-remove set exactly once.
    pub async fn remove(&self, id: &str) -> CoreResult<()> {
        self.apply_ops(vec![WriteOp::Remove(id.to_string())]).await
    }

    /// Starts a query against the live document set.
    #[must_use]
    pub fn find(&self, query: impl Into<Query>) -> Find {
        Find {
            collection: self.clone(),
            query: query.into(),
        }
    }

    /// Reads one live document by id.
    pub async fn get(&self, id: &str) -> CoreResult<Option<Document>> {
        match self.inner.adapter.get(self.inner.tables.live(), id)? {
            Some(bytes) => Ok(Some(Document::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns the number of live documents.
    pub async fn count(&self) -> CoreResult<usize> {
        Ok(self.inner.adapter.scan(self.inner.tables.live())?.len())
    }

    /// Returns the pending-upsert journal, ordered by id.
    ///
    /// Read-only: entries stay journaled until the external sync
    /// consumer clears them.
    pub async fn pending_upserts(&self) -> CoreResult<Vec<PendingUpsert>> {
        let rows = self.inner.adapter.scan(self.inner.tables.pending_upserts())?;
        let mut entries = Vec::with_capacity(rows.len());
        for (id, bytes) in rows {
            let (doc, base) = journal::decode_entry(&bytes)?;
            entries.push(PendingUpsert { id, doc, base });
        }
        Ok(entries)
    }

    /// Returns the pending-remove ids, ordered.
    ///
    /// Read-only, like [`Collection::pending_upserts`].
    pub async fn pending_removes(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .inner
            .adapter
            .scan(self.inner.tables.pending_removes())?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    async fn apply_ops(&self, ops: Vec<WriteOp>) -> CoreResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let _guard = self.inner.write_lock.lock().await;

        let state = JournalState::load(self.inner.adapter.as_ref(), &self.inner.tables)?;
        let batch = journal::plan(&self.inner.tables, &state, &ops)?;
        self.inner.adapter.apply(&batch)?;

        tracing::debug!(
            collection = %self.inner.tables.collection,
            ops = ops.len(),
            "applied write batch"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("namespace", &self.namespace())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// A prepared query; call [`Find::fetch`] to run it.
#[derive(Debug, Clone)]
pub struct Find {
    collection: Collection,
    query: Query,
}

impl Find {
    /// Evaluates the predicate against the live document set.
    ///
    /// Results are ordered by id. Removed documents never appear.
    pub async fn fetch(&self) -> CoreResult<Vec<Document>> {
        let inner = &self.collection.inner;
        let rows = inner.adapter.scan(inner.tables.live())?;

        let mut results = Vec::new();
        for (_, bytes) in rows {
            let doc = Document::decode(&bytes)?;
            if inner.evaluator.matches(&doc, &self.query) {
                results.push(doc);
            }
        }
        Ok(results)
    }
}
