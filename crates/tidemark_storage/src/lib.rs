//! # Tidemark Storage
//!
//! Durable store adapter trait and implementations for Tidemark.
//!
//! This crate provides the lowest-level storage abstraction: per
//! namespace and collection, named tables of `key -> bytes` rows, with
//! atomic batched writes. Adapters are **opaque keyed byte stores** -
//! they never interpret the values they hold.
//!
//! ## Design Principles
//!
//! - Batches apply atomically and are durable when `apply` returns
//! - Reads go through to the underlying resource: no per-handle cache,
//!   so independently opened handles observe each other's writes
//! - Opening a resource never takes an exclusive lock; any number of
//!   handles may coexist
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Adapters
//!
//! - [`MemoryAdapter`] - shared in-memory store for tests and ephemeral data
//! - [`FileAdapter`] - append-only journal files, one per namespace
//!
//! ## Example
//!
//! ```rust
//! use tidemark_storage::{MemoryAdapter, StoreAdapter, TableRef, WriteBatch};
//!
//! let adapter = MemoryAdapter::new();
//! let table = TableRef::new("app", "notes", "live");
//!
//! let mut batch = WriteBatch::new();
//! batch.put(table, "1", b"hello".to_vec());
//! adapter.apply(&batch).unwrap();
//!
//! assert_eq!(adapter.get(table, "1").unwrap(), Some(b"hello".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod file;
mod frame;
mod memory;

pub use adapter::{BatchOp, StoreAdapter, TableId, TableRef, WriteBatch};
pub use error::{StorageError, StorageResult};
pub use file::FileAdapter;
pub use frame::{crc32, FrameReader, LogOp, FRAME_MAGIC, FRAME_VERSION};
pub use memory::MemoryAdapter;
