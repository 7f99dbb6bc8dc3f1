//! Fault-injecting adapter wrapper.
//!
//! Wraps any [`StoreAdapter`] and fails a configurable number of
//! upcoming `apply` calls with an I/O error, without touching the
//! underlying state. Used to verify that a failed batch leaves nothing
//! behind and that adapter errors surface through the store's error
//! path.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tidemark_storage::{StorageError, StorageResult, StoreAdapter, TableRef, WriteBatch};

/// An adapter wrapper that injects write failures.
///
/// # Example
///
/// ```rust,ignore
/// let inner = Arc::new(MemoryAdapter::new());
/// let faulty = Arc::new(FaultAdapter::new(inner));
/// faulty.fail_next_applies(1);
///
/// let db = Database::open(faulty.clone(), Config::new("app")).await?;
/// // the next write errors; nothing is applied
/// ```
pub struct FaultAdapter {
    inner: Arc<dyn StoreAdapter>,
    failures_left: AtomicUsize,
}

impl FaultAdapter {
    /// Wraps an adapter; no faults are armed initially.
    pub fn new(inner: Arc<dyn StoreAdapter>) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Arms the next `count` apply calls to fail.
    pub fn fail_next_applies(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Returns how many armed failures remain.
    pub fn failures_left(&self) -> usize {
        self.failures_left.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl StoreAdapter for FaultAdapter {
    fn get(&self, table: TableRef<'_>, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(table, key)
    }

    fn scan(&self, table: TableRef<'_>) -> StorageResult<Vec<(String, Vec<u8>)>> {
        self.inner.scan(table)
    }

    fn apply(&self, batch: &WriteBatch) -> StorageResult<()> {
        if self.take_failure() {
            return Err(StorageError::Io(io::Error::other("injected write fault")));
        }
        self.inner.apply(batch)
    }

    fn drop_collection(&self, namespace: &str, collection: &str) -> StorageResult<()> {
        self.inner.drop_collection(namespace, collection)
    }
}
