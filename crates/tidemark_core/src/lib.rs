//! # Tidemark Core
//!
//! A local, durable, offline-first document store that tracks
//! unsynchronized mutations for a later sync process.
//!
//! Collections hold JSON-shaped documents keyed by a string `id`.
//! Alongside ordinary CRUD and queries, every collection maintains a
//! mutation journal: pending upserts that pair each document's current
//! value with the base snapshot frozen at its first unsynced edit, and a
//! set of pending removes. A sync layer reads the journals with
//! [`Collection::pending_upserts`] and [`Collection::pending_removes`]
//! and computes one correct forward diff per document no matter how many
//! local edits piled up; clearing acknowledged entries is that layer's
//! job, not this crate's.
//!
//! ## Example
//!
//! ```rust
//! use tidemark_core::{Database, Document};
//!
//! # async fn demo() -> tidemark_core::CoreResult<()> {
//! let db = Database::open_in_memory("app").await?;
//! let notes = db.collection("notes").await?;
//!
//! // Establish an already-synced baseline, then edit it locally.
//! notes.seed(Document::new("1").with("text", "hello")).await?;
//! notes.upsert(Document::new("1").with("text", "hello, world")).await?;
//!
//! let pending = notes.pending_upserts().await?;
//! assert_eq!(pending.len(), 1);
//! let base = pending[0].base.as_ref().unwrap();
//! assert_eq!(base.get("text").and_then(|v| v.as_text()), Some("hello"));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod database;
mod error;
mod journal;
mod query;

pub use collection::{Collection, Find};
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use journal::PendingUpsert;
pub use query::{FieldEvaluator, Query, QueryEvaluator};

// The document model and adapter seam are part of this crate's API.
pub use tidemark_codec::{Document, Value};
pub use tidemark_storage::{FileAdapter, MemoryAdapter, StoreAdapter};
