//! Mutation journal engine.
//!
//! Every collection keeps four adapter tables:
//!
//! - `live` - the queryable document set
//! - `base` - per id, the last value known to the remote side (or cached
//!   as such)
//! - `pending_upserts` - per id, the current value plus the base snapshot
//!   frozen at the FIRST unsynced edit
//! - `pending_removes` - ids removed locally, awaiting acknowledgment
//!
//! This module decides, for every write, how those tables change:
//!
//! | operation  | live       | base     | pending upsert            | pending remove |
//! |------------|------------|----------|---------------------------|----------------|
//! | `seed`     | put doc    | put doc  | clear                     | unmark         |
//! | `cache_one`| -          | put doc  | -                         | -              |
//! | `upsert`   | put doc    | -        | create or advance `doc`   | unmark         |
//! | `remove`   | delete     | -        | clear                     | mark           |
//!
//! # Invariants
//!
//! - At most one pending entry per id; its `base` is set when the entry
//!   is created and never changes while the entry lives, only `doc`
//!   advances. A sync consumer can therefore compute one correct forward
//!   diff no matter how many local edits accumulated.
//! - An upsert of an id currently marked removed starts a fresh entry
//!   with no base: the remove was never acknowledged, so the only safe
//!   diff is the whole document.
//! - A batch folds in call order over an overlay of the stored state, so
//!   the same id written twice in one call compounds exactly like two
//!   separate calls, and the result is emitted as one atomic
//!   [`WriteBatch`].

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::collections::HashSet;
use tidemark_codec::{from_cbor, to_canonical_cbor, CodecResult, Document, Value};
use tidemark_storage::{StoreAdapter, TableRef, WriteBatch};

/// Table holding the live document set.
pub(crate) const LIVE_TABLE: &str = "live";
/// Table holding base snapshots.
pub(crate) const BASE_TABLE: &str = "base";
/// Table holding pending upsert entries.
pub(crate) const PENDING_UPSERTS_TABLE: &str = "pending_upserts";
/// Table holding the pending remove set.
pub(crate) const PENDING_REMOVES_TABLE: &str = "pending_removes";

/// A journal entry awaiting sync: the document's current value and the
/// base snapshot taken when its first unsynced edit was made.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpsert {
    /// The document id.
    pub id: String,
    /// The current document value.
    pub doc: Document,
    /// Pre-edit snapshot; `None` means the document is new to the
    /// remote side.
    pub base: Option<Document>,
}

/// Names the four tables of one collection.
#[derive(Debug, Clone)]
pub(crate) struct CollectionTables {
    pub namespace: String,
    pub collection: String,
}

impl CollectionTables {
    pub fn new(namespace: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            collection: collection.into(),
        }
    }

    pub fn live(&self) -> TableRef<'_> {
        TableRef::new(&self.namespace, &self.collection, LIVE_TABLE)
    }

    pub fn base(&self) -> TableRef<'_> {
        TableRef::new(&self.namespace, &self.collection, BASE_TABLE)
    }

    pub fn pending_upserts(&self) -> TableRef<'_> {
        TableRef::new(&self.namespace, &self.collection, PENDING_UPSERTS_TABLE)
    }

    pub fn pending_removes(&self) -> TableRef<'_> {
        TableRef::new(&self.namespace, &self.collection, PENDING_REMOVES_TABLE)
    }
}

/// One write against a collection, in caller order.
#[derive(Debug, Clone)]
pub(crate) enum WriteOp {
    Upsert(Document),
    Seed(Document),
    CacheOne(Document),
    Remove(String),
}

/// A pending entry's stored form: current doc plus frozen base.
type PendingEntry = (Document, Option<Document>);

/// Snapshot of a collection's journal-relevant state.
#[derive(Debug, Default)]
pub(crate) struct JournalState {
    pub base: HashMap<String, Document>,
    pub pending: HashMap<String, PendingEntry>,
    pub removed: HashSet<String>,
}

impl JournalState {
    /// Loads the journal state from the adapter.
    pub fn load(adapter: &dyn StoreAdapter, tables: &CollectionTables) -> CoreResult<Self> {
        let mut base = HashMap::new();
        for (id, bytes) in adapter.scan(tables.base())? {
            base.insert(id, Document::decode(&bytes)?);
        }

        let mut pending = HashMap::new();
        for (id, bytes) in adapter.scan(tables.pending_upserts())? {
            pending.insert(id, decode_entry(&bytes)?);
        }

        let removed = adapter
            .scan(tables.pending_removes())?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        Ok(Self {
            base,
            pending,
            removed,
        })
    }
}

/// Net effect of a batch on one id. `None` facets are untouched.
#[derive(Debug, Default)]
struct IdEffect {
    /// `Some(Some(doc))` puts, `Some(None)` deletes the live row.
    live: Option<Option<Document>>,
    /// Base rows are only ever written, never deleted, by local writes.
    base: Option<Document>,
    /// `Some(Some(entry))` puts, `Some(None)` clears the pending entry.
    pending: Option<Option<PendingEntry>>,
    /// Membership in the pending-remove set.
    removed: Option<bool>,
}

/// Folds a sequence of writes into one atomic [`WriteBatch`].
///
/// Writes fold in call order; distinct ids are independent. Validation
/// happens here too: any document without a string id fails the whole
/// batch before anything is emitted.
pub(crate) fn plan(
    tables: &CollectionTables,
    state: &JournalState,
    ops: &[WriteOp],
) -> CoreResult<WriteBatch> {
    let mut effects: HashMap<String, IdEffect> = HashMap::new();

    for (index, op) in ops.iter().enumerate() {
        match op {
            WriteOp::Upsert(doc) => {
                let id = require_id(doc, index)?;
                // Read through the overlay so a second write to the same
                // id in this batch sees the first one's effect.
                let removed_now = effects
                    .get(id)
                    .and_then(|e| e.removed)
                    .unwrap_or_else(|| state.removed.contains(id));
                let pending_now = match effects.get(id).map(|e| &e.pending) {
                    Some(Some(overlay)) => overlay.clone(),
                    _ => state.pending.get(id).cloned(),
                };
                let base_now = match effects.get(id).map(|e| &e.base) {
                    Some(Some(overlay)) => Some(overlay.clone()),
                    _ => state.base.get(id).cloned(),
                };

                let entry = if removed_now {
                    // Id reuse after an unacknowledged remove: fresh
                    // entry, whole-document diff.
                    (doc.clone(), None)
                } else if let Some((_, frozen_base)) = pending_now {
                    // Entry exists: only doc advances.
                    (doc.clone(), frozen_base)
                } else {
                    (doc.clone(), base_now)
                };

                let effect = effects.entry(id.to_string()).or_default();
                effect.live = Some(Some(doc.clone()));
                effect.pending = Some(Some(entry));
                effect.removed = Some(false);
            }
            WriteOp::Seed(doc) => {
                let id = require_id(doc, index)?;
                let effect = effects.entry(id.to_string()).or_default();
                effect.live = Some(Some(doc.clone()));
                effect.base = Some(doc.clone());
                effect.pending = Some(None);
                effect.removed = Some(false);
            }
            WriteOp::CacheOne(doc) => {
                let id = require_id(doc, index)?;
                let effect = effects.entry(id.to_string()).or_default();
                effect.base = Some(doc.clone());
            }
            WriteOp::Remove(id) => {
                let effect = effects.entry(id.clone()).or_default();
                effect.live = Some(None);
                effect.pending = Some(None);
                effect.removed = Some(true);
            }
        }
    }

    // Emit in id order for a deterministic batch.
    let mut ids: Vec<&String> = effects.keys().collect();
    ids.sort();

    let mut batch = WriteBatch::new();
    for id in ids {
        let effect = &effects[id];

        if let Some(live) = &effect.live {
            match live {
                Some(doc) => batch.put(tables.live(), id.clone(), doc.encode()?),
                None => batch.delete(tables.live(), id.clone()),
            }
        }
        if let Some(base) = &effect.base {
            batch.put(tables.base(), id.clone(), base.encode()?);
        }
        if let Some(pending) = &effect.pending {
            match pending {
                Some((doc, entry_base)) => batch.put(
                    tables.pending_upserts(),
                    id.clone(),
                    encode_entry(doc, entry_base.as_ref())?,
                ),
                None => batch.delete(tables.pending_upserts(), id.clone()),
            }
        }
        if let Some(removed) = effect.removed {
            if removed {
                batch.put(tables.pending_removes(), id.clone(), Vec::new());
            } else {
                batch.delete(tables.pending_removes(), id.clone());
            }
        }
    }

    Ok(batch)
}

fn require_id(doc: &Document, index: usize) -> CoreResult<&str> {
    doc.id().ok_or(CoreError::MissingId { index })
}

/// Encodes a pending entry as `{doc, base}`; an absent base encodes as
/// null.
pub(crate) fn encode_entry(doc: &Document, base: Option<&Document>) -> CodecResult<Vec<u8>> {
    let base_value = base.cloned().map_or(Value::Null, Document::into_value);
    to_canonical_cbor(&Value::map(vec![
        ("doc".into(), doc.clone().into_value()),
        ("base".into(), base_value),
    ]))
}

/// Decodes a pending entry's stored form.
pub(crate) fn decode_entry(bytes: &[u8]) -> CoreResult<PendingEntry> {
    let value = from_cbor(bytes)?;
    let doc = match value.get("doc") {
        Some(v) => Document::from_value(v.clone())?,
        None => return Err(CoreError::invalid_entry("missing doc field")),
    };
    let base = match value.get("base") {
        None | Some(Value::Null) => None,
        Some(v) => Some(Document::from_value(v.clone())?),
    };
    Ok((doc, base))
}
