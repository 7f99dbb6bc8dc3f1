//! Shared in-memory store adapter.

use crate::adapter::{BatchOp, StoreAdapter, TableRef, WriteBatch};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type TableKey = (String, String, String);
type Tables = BTreeMap<TableKey, BTreeMap<String, Vec<u8>>>;

/// An in-memory store adapter.
///
/// The adapter value itself is the durable resource: cloning it (or the
/// `Arc` it is held in) yields another handle onto the **same** tables,
/// which is how tests model several independently opened handles on one
/// namespace. Data lives as long as any clone does and is lost when the
/// last one drops.
///
/// # Thread Safety
///
/// All operations take a single lock over the table map, which also
/// makes `apply` trivially atomic.
///
/// # Example
///
/// ```
/// use tidemark_storage::{MemoryAdapter, StoreAdapter, TableRef, WriteBatch};
///
/// let adapter = MemoryAdapter::new();
/// let table = TableRef::new("app", "notes", "live");
///
/// let mut batch = WriteBatch::new();
/// batch.put(table, "1", b"hello".to_vec());
/// adapter.apply(&batch).unwrap();
///
/// let other_handle = adapter.clone();
/// assert_eq!(other_handle.get(table, "1").unwrap(), Some(b"hello".to_vec()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryAdapter {
    /// Creates a new empty in-memory adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all data from every namespace.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    /// Returns the number of non-empty tables, for diagnostics.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    fn key(table: TableRef<'_>) -> TableKey {
        (
            table.namespace.to_string(),
            table.collection.to_string(),
            table.table.to_string(),
        )
    }
}

impl StoreAdapter for MemoryAdapter {
    fn get(&self, table: TableRef<'_>, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&Self::key(table))
            .and_then(|rows| rows.get(key).cloned()))
    }

    fn scan(&self, table: TableRef<'_>) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&Self::key(table))
            .map(|rows| {
                rows.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn apply(&self, batch: &WriteBatch) -> StorageResult<()> {
        let mut tables = self.tables.write();
        for op in batch.ops() {
            match op {
                BatchOp::Put { table, key, value } => {
                    tables
                        .entry(Self::key(table.as_table_ref()))
                        .or_default()
                        .insert(key.clone(), value.clone());
                }
                BatchOp::Delete { table, key } => {
                    if let Some(rows) = tables.get_mut(&Self::key(table.as_table_ref())) {
                        rows.remove(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn drop_collection(&self, namespace: &str, collection: &str) -> StorageResult<()> {
        let mut tables = self.tables.write();
        tables.retain(|(ns, coll, _), _| !(ns == namespace && coll == collection));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> TableRef<'static> {
        TableRef::new("ns", "scratch", "live")
    }

    #[test]
    fn new_adapter_is_empty() {
        let adapter = MemoryAdapter::new();
        assert_eq!(adapter.table_count(), 0);
        assert_eq!(adapter.get(live(), "1").unwrap(), None);
        assert!(adapter.scan(live()).unwrap().is_empty());
    }

    #[test]
    fn put_then_get() {
        let adapter = MemoryAdapter::new();
        let mut batch = WriteBatch::new();
        batch.put(live(), "1", vec![1, 2, 3]);
        adapter.apply(&batch).unwrap();

        assert_eq!(adapter.get(live(), "1").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn scan_is_key_sorted() {
        let adapter = MemoryAdapter::new();
        let mut batch = WriteBatch::new();
        batch.put(live(), "b", vec![2]);
        batch.put(live(), "a", vec![1]);
        batch.put(live(), "c", vec![3]);
        adapter.apply(&batch).unwrap();

        let rows = adapter.scan(live()).unwrap();
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn later_ops_shadow_earlier_ones() {
        let adapter = MemoryAdapter::new();
        let mut batch = WriteBatch::new();
        batch.put(live(), "1", vec![1]);
        batch.put(live(), "1", vec![2]);
        batch.delete(live(), "2");
        adapter.apply(&batch).unwrap();

        assert_eq!(adapter.get(live(), "1").unwrap(), Some(vec![2]));
    }

    #[test]
    fn clones_share_state() {
        let adapter = MemoryAdapter::new();
        let other = adapter.clone();

        let mut batch = WriteBatch::new();
        batch.put(live(), "1", vec![42]);
        adapter.apply(&batch).unwrap();

        assert_eq!(other.get(live(), "1").unwrap(), Some(vec![42]));
    }

    #[test]
    fn tables_are_isolated() {
        let adapter = MemoryAdapter::new();
        let base = TableRef::new("ns", "scratch", "base");

        let mut batch = WriteBatch::new();
        batch.put(live(), "1", vec![1]);
        adapter.apply(&batch).unwrap();

        assert_eq!(adapter.get(base, "1").unwrap(), None);
    }

    #[test]
    fn drop_collection_removes_all_tables() {
        let adapter = MemoryAdapter::new();
        let base = TableRef::new("ns", "scratch", "base");
        let other = TableRef::new("ns", "other", "live");

        let mut batch = WriteBatch::new();
        batch.put(live(), "1", vec![1]);
        batch.put(base, "1", vec![2]);
        batch.put(other, "1", vec![3]);
        adapter.apply(&batch).unwrap();

        adapter.drop_collection("ns", "scratch").unwrap();

        assert_eq!(adapter.get(live(), "1").unwrap(), None);
        assert_eq!(adapter.get(base, "1").unwrap(), None);
        assert_eq!(adapter.get(other, "1").unwrap(), Some(vec![3]));
    }

    #[test]
    fn drop_missing_collection_is_a_no_op() {
        let adapter = MemoryAdapter::new();
        adapter.drop_collection("ns", "ghost").unwrap();
    }
}
