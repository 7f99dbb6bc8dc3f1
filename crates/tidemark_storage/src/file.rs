//! File-backed store adapter.

use crate::adapter::{BatchOp, StoreAdapter, TableRef, WriteBatch};
use crate::error::{StorageError, StorageResult};
use crate::frame::{encode_frame, FrameReader, LogOp};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Journal file name within a namespace directory.
const JOURNAL_FILE: &str = "journal.log";
/// Advisory lock file guarding journal writes and compaction.
const LOCK_FILE: &str = "LOCK";
/// Temporary file for atomic compaction.
const JOURNAL_TEMP: &str = "journal.log.tmp";

type Tables = BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>;

/// A file-backed store adapter.
///
/// Each namespace is a subdirectory of the adapter root holding an
/// append-only journal. Every applied batch is one framed record, so a
/// crash mid-append leaves a torn tail frame that fails its checksum and
/// is ignored on replay - batches are all-or-nothing.
///
/// # Multi-handle access
///
/// Any number of adapters may be opened on the same root concurrently,
/// in the same process or across processes. Reads always replay the
/// on-disk journal (there is no per-handle cache to go stale), and a
/// short-lived advisory lock on the namespace's `LOCK` file serializes
/// writers. Opening never takes an exclusive lock.
///
/// # Example
///
/// ```no_run
/// use tidemark_storage::{FileAdapter, StoreAdapter, TableRef, WriteBatch};
/// use std::path::Path;
///
/// let adapter = FileAdapter::open(Path::new("data")).unwrap();
/// let table = TableRef::new("app", "notes", "live");
///
/// let mut batch = WriteBatch::new();
/// batch.put(table, "1", b"hello".to_vec());
/// adapter.apply(&batch).unwrap();
/// ```
#[derive(Debug)]
pub struct FileAdapter {
    root: PathBuf,
    sync_writes: bool,
}

impl FileAdapter {
    /// Opens an adapter rooted at the given directory, creating it if
    /// missing. Writes are fsynced before an apply reports success.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> StorageResult<Self> {
        Self::open_with_sync(root, true)
    }

    /// Opens an adapter with explicit control over write syncing.
    ///
    /// Turning syncing off trades crash durability for speed; batches
    /// are still atomic either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_sync(root: &Path, sync_writes: bool) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            sync_writes,
        })
    }

    /// Returns the adapter's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rewrites a namespace's journal down to its current state.
    ///
    /// Superseded rows and dropped collections are discarded. Observable
    /// state is unchanged. Writers are excluded for the duration.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    pub fn compact(&self, namespace: &str) -> StorageResult<()> {
        let journal = self.journal_path(namespace);
        if !journal.exists() {
            return Ok(());
        }

        let _lock = self.lock(namespace, true)?;
        let tables = self.replay_locked(namespace)?;

        // One snapshot frame per table.
        let mut data = Vec::new();
        for ((collection, table), rows) in &tables {
            let ops: Vec<LogOp> = rows
                .iter()
                .map(|(key, value)| LogOp::Put {
                    collection: collection.clone(),
                    table: table.clone(),
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect();
            data.extend_from_slice(&encode_frame(&ops)?);
        }

        // Write-then-rename keeps the journal valid at every instant.
        let temp = self.root.join(namespace).join(JOURNAL_TEMP);
        let mut file = File::create(&temp)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &journal)?;
        sync_dir(&self.root.join(namespace))?;
        Ok(())
    }

    fn journal_path(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace).join(JOURNAL_FILE)
    }

    /// Takes the namespace's advisory lock: shared for reads, exclusive
    /// for writes and compaction. The lock is released on drop.
    fn lock(&self, namespace: &str, exclusive: bool) -> StorageResult<File> {
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        if exclusive {
            lock_file.lock_exclusive()?;
        } else {
            lock_file.lock_shared()?;
        }
        Ok(lock_file)
    }

    /// Replays the journal into table maps. Caller holds the lock.
    fn replay_locked(&self, namespace: &str) -> StorageResult<Tables> {
        let journal = self.journal_path(namespace);
        if !journal.exists() {
            return Ok(Tables::new());
        }

        let mut data = Vec::new();
        File::open(&journal)?.read_to_end(&mut data)?;

        let mut tables = Tables::new();
        let mut reader = FrameReader::new(&data);
        loop {
            match reader.next_frame() {
                Ok(Some(ops)) => {
                    for op in ops {
                        apply_log_op(&mut tables, op);
                    }
                }
                Ok(None) => break,
                // A torn or corrupt frame marks the end of the usable
                // log: everything before it was a complete batch.
                Err(_) => break,
            }
        }
        Ok(tables)
    }

    fn replay(&self, namespace: &str) -> StorageResult<Tables> {
        if !self.journal_path(namespace).exists() {
            return Ok(Tables::new());
        }
        let _lock = self.lock(namespace, false)?;
        self.replay_locked(namespace)
    }

    fn append(&self, namespace: &str, ops: &[LogOp]) -> StorageResult<()> {
        let frame = encode_frame(ops)?;

        let _lock = self.lock(namespace, true)?;
        let journal = self.journal_path(namespace);
        let created = !journal.exists();

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&journal)?;
        file.write_all(&frame)?;
        if self.sync_writes {
            file.sync_all()?;
        }
        drop(file);

        if created && self.sync_writes {
            sync_dir(&self.root.join(namespace))?;
        }
        Ok(())
    }
}

fn apply_log_op(tables: &mut Tables, op: LogOp) {
    match op {
        LogOp::Put {
            collection,
            table,
            key,
            value,
        } => {
            tables
                .entry((collection, table))
                .or_default()
                .insert(key, value);
        }
        LogOp::Delete {
            collection,
            table,
            key,
        } => {
            if let Some(rows) = tables.get_mut(&(collection, table)) {
                rows.remove(&key);
            }
        }
        LogOp::DropCollection { collection } => {
            tables.retain(|(coll, _), _| coll != &collection);
        }
    }
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> StorageResult<()> {
    // On Unix, fsync on a directory syncs the directory entries.
    File::open(path)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> StorageResult<()> {
    // Windows NTFS journaling covers metadata durability.
    Ok(())
}

impl StoreAdapter for FileAdapter {
    fn get(&self, table: TableRef<'_>, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let tables = self.replay(table.namespace)?;
        Ok(tables
            .get(&(table.collection.to_string(), table.table.to_string()))
            .and_then(|rows| rows.get(key).cloned()))
    }

    fn scan(&self, table: TableRef<'_>) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let tables = self.replay(table.namespace)?;
        Ok(tables
            .get(&(table.collection.to_string(), table.table.to_string()))
            .map(|rows| {
                rows.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn apply(&self, batch: &WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // One journal per namespace, so one frame cannot span two.
        let namespace = match batch.ops().first() {
            Some(BatchOp::Put { table, .. } | BatchOp::Delete { table, .. }) => {
                table.namespace.clone()
            }
            None => return Ok(()),
        };

        let mut ops = Vec::with_capacity(batch.len());
        for op in batch.ops() {
            let (table, log_op) = match op {
                BatchOp::Put { table, key, value } => (
                    table,
                    LogOp::Put {
                        collection: table.collection.clone(),
                        table: table.table.clone(),
                        key: key.clone(),
                        value: value.clone(),
                    },
                ),
                BatchOp::Delete { table, key } => (
                    table,
                    LogOp::Delete {
                        collection: table.collection.clone(),
                        table: table.table.clone(),
                        key: key.clone(),
                    },
                ),
            };
            if table.namespace != namespace {
                return Err(StorageError::invalid_batch(
                    "a batch must not span namespaces",
                ));
            }
            ops.push(log_op);
        }

        self.append(&namespace, &ops)
    }

    fn drop_collection(&self, namespace: &str, collection: &str) -> StorageResult<()> {
        if !self.journal_path(namespace).exists() {
            return Ok(());
        }
        self.append(
            namespace,
            &[LogOp::DropCollection {
                collection: collection.to_string(),
            }],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn live() -> TableRef<'static> {
        TableRef::new("ns", "scratch", "live")
    }

    fn put_one(adapter: &FileAdapter, key: &str, value: &[u8]) {
        let mut batch = WriteBatch::new();
        batch.put(live(), key, value.to_vec());
        adapter.apply(&batch).unwrap();
    }

    #[test]
    fn put_then_get() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();

        put_one(&adapter, "1", b"alpha");
        assert_eq!(adapter.get(live(), "1").unwrap(), Some(b"alpha".to_vec()));
        assert_eq!(adapter.get(live(), "2").unwrap(), None);
    }

    #[test]
    fn data_visible_to_second_adapter() {
        let dir = tempdir().unwrap();
        let first = FileAdapter::open(dir.path()).unwrap();
        put_one(&first, "1", b"alpha");

        let second = FileAdapter::open(dir.path()).unwrap();
        assert_eq!(second.get(live(), "1").unwrap(), Some(b"alpha".to_vec()));

        // And writes through the second are visible to the first
        let mut batch = WriteBatch::new();
        batch.put(live(), "2", b"beta".to_vec());
        second.apply(&batch).unwrap();
        assert_eq!(first.get(live(), "2").unwrap(), Some(b"beta".to_vec()));
    }

    #[test]
    fn scan_is_key_sorted() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();

        put_one(&adapter, "b", b"2");
        put_one(&adapter, "a", b"1");
        put_one(&adapter, "c", b"3");

        let keys: Vec<String> = adapter
            .scan(live())
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn delete_removes_row() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();
        put_one(&adapter, "1", b"alpha");

        let mut batch = WriteBatch::new();
        batch.delete(live(), "1");
        adapter.apply(&batch).unwrap();

        assert_eq!(adapter.get(live(), "1").unwrap(), None);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();
        adapter.apply(&WriteBatch::new()).unwrap();
        assert!(!dir.path().join("ns").exists());
    }

    #[test]
    fn cross_namespace_batch_rejected() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(TableRef::new("a", "c", "live"), "1", vec![1]);
        batch.put(TableRef::new("b", "c", "live"), "1", vec![1]);

        assert!(matches!(
            adapter.apply(&batch),
            Err(StorageError::InvalidBatch { .. })
        ));
    }

    #[test]
    fn torn_tail_frame_is_ignored() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();
        put_one(&adapter, "1", b"alpha");

        // Simulate a crash mid-append: garbage after the last good frame
        let journal = dir.path().join("ns").join("journal.log");
        let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
        file.write_all(b"TMLG\x01\x00garbage").unwrap();
        drop(file);

        let reopened = FileAdapter::open(dir.path()).unwrap();
        assert_eq!(reopened.get(live(), "1").unwrap(), Some(b"alpha".to_vec()));
    }

    #[test]
    fn drop_collection_persists() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();
        put_one(&adapter, "1", b"alpha");

        adapter.drop_collection("ns", "scratch").unwrap();
        assert_eq!(adapter.get(live(), "1").unwrap(), None);

        let reopened = FileAdapter::open(dir.path()).unwrap();
        assert_eq!(reopened.get(live(), "1").unwrap(), None);
    }

    #[test]
    fn drop_collection_without_journal_is_a_no_op() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();
        adapter.drop_collection("ns", "ghost").unwrap();
    }

    #[test]
    fn compact_preserves_state_and_shrinks_journal() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();

        for i in 0..20 {
            put_one(&adapter, "1", format!("value-{i}").as_bytes());
        }
        put_one(&adapter, "2", b"kept");

        let journal = dir.path().join("ns").join("journal.log");
        let before = fs::metadata(&journal).unwrap().len();

        adapter.compact("ns").unwrap();

        let after = fs::metadata(&journal).unwrap().len();
        assert!(after < before);
        assert_eq!(adapter.get(live(), "1").unwrap(), Some(b"value-19".to_vec()));
        assert_eq!(adapter.get(live(), "2").unwrap(), Some(b"kept".to_vec()));
    }

    #[test]
    fn compact_missing_namespace_is_a_no_op() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::open(dir.path()).unwrap();
        adapter.compact("ghost").unwrap();
    }
}
