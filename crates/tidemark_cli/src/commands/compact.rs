//! Journal compaction command.

use std::path::Path;
use tidemark_storage::FileAdapter;
use tracing::info;

/// Rewrites the namespace journal down to its current state.
pub fn run(root: &Path, namespace: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Compacting namespace {namespace}");

    let adapter = FileAdapter::open(root)?;
    adapter.compact(namespace)?;

    println!("compacted namespace {namespace}");
    Ok(())
}
