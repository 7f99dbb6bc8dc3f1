//! Store adapter trait definition.

use crate::error::StorageResult;

/// Identifies one named table: `namespace / collection / table`.
///
/// Borrowed form used by read paths; see [`TableId`] for the owned form
/// carried inside a [`WriteBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    /// Namespace the table belongs to.
    pub namespace: &'a str,
    /// Collection the table belongs to.
    pub collection: &'a str,
    /// Table name within the collection.
    pub table: &'a str,
}

impl<'a> TableRef<'a> {
    /// Creates a table reference.
    #[must_use]
    pub const fn new(namespace: &'a str, collection: &'a str, table: &'a str) -> Self {
        Self {
            namespace,
            collection,
            table,
        }
    }

    /// Returns the owned form of this reference.
    #[must_use]
    pub fn to_id(self) -> TableId {
        TableId {
            namespace: self.namespace.to_string(),
            collection: self.collection.to_string(),
            table: self.table.to_string(),
        }
    }
}

/// Owned table identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableId {
    /// Namespace the table belongs to.
    pub namespace: String,
    /// Collection the table belongs to.
    pub collection: String,
    /// Table name within the collection.
    pub table: String,
}

impl TableId {
    /// Returns the borrowed form of this identifier.
    #[must_use]
    pub fn as_table_ref(&self) -> TableRef<'_> {
        TableRef {
            namespace: &self.namespace,
            collection: &self.collection,
            table: &self.table,
        }
    }
}

/// A single operation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or replace the value stored under `key`.
    Put {
        /// Target table.
        table: TableId,
        /// Row key.
        key: String,
        /// Row value (opaque bytes).
        value: Vec<u8>,
    },
    /// Remove the value stored under `key`, if any.
    Delete {
        /// Target table.
        table: TableId,
        /// Row key.
        key: String,
    },
}

/// An ordered set of writes applied atomically.
///
/// Later operations on the same table/key shadow earlier ones; adapters
/// apply operations in order, so no merging is required when building a
/// batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a put operation.
    pub fn put(&mut self, table: TableRef<'_>, key: impl Into<String>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put {
            table: table.to_id(),
            key: key.into(),
            value,
        });
    }

    /// Appends a delete operation.
    pub fn delete(&mut self, table: TableRef<'_>, key: impl Into<String>) {
        self.ops.push(BatchOp::Delete {
            table: table.to_id(),
            key: key.into(),
        });
    }

    /// Returns the operations in application order.
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the batch contains no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A durable store adapter for Tidemark.
///
/// Adapters are **opaque keyed byte stores**: per namespace and
/// collection they hold named tables of `key -> bytes` rows. Tidemark
/// owns all value interpretation - adapters never decode documents or
/// journal entries.
///
/// # Invariants
///
/// - `apply` is atomic: after a failure no operation of the batch is
///   observable, after success all are, and the result is durable
/// - `scan` returns rows sorted by key
/// - reads observe every previously applied batch, including batches
///   applied through other adapter handles on the same underlying
///   resource (read-after-write across handles)
/// - Adapters must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryAdapter`] - shared in-memory store, for tests
/// - [`super::FileAdapter`] - append-only journal files on disk
pub trait StoreAdapter: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn get(&self, table: TableRef<'_>, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Returns all rows of a table, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn scan(&self, table: TableRef<'_>) -> StorageResult<Vec<(String, Vec<u8>)>>;

    /// Applies a batch of writes atomically.
    ///
    /// After this returns successfully, all operations are durable and
    /// visible to every handle on the same underlying resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch violates an adapter constraint or
    /// an I/O error occurs; in that case none of the operations are
    /// applied.
    fn apply(&self, batch: &WriteBatch) -> StorageResult<()>;

    /// Removes every table of the given collection.
    ///
    /// Idempotent: succeeds if the collection has no tables.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn drop_collection(&self, namespace: &str, collection: &str) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_records_ops_in_order() {
        let table = TableRef::new("ns", "coll", "live");
        let mut batch = WriteBatch::new();
        batch.put(table, "a", vec![1]);
        batch.delete(table, "b");

        assert_eq!(batch.len(), 2);
        assert!(matches!(batch.ops()[0], BatchOp::Put { .. }));
        assert!(matches!(batch.ops()[1], BatchOp::Delete { .. }));
    }

    #[test]
    fn empty_batch() {
        let batch = WriteBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn table_ref_round_trips_through_id() {
        let table = TableRef::new("ns", "coll", "base");
        let id = table.to_id();
        assert_eq!(id.as_table_ref(), table);
    }
}
