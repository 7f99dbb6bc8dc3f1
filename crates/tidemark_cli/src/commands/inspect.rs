//! Namespace inspection command.

use serde::Serialize;
use tidemark_core::Database;
use tracing::info;

#[derive(Serialize)]
struct CollectionReport {
    name: String,
    live: usize,
    pending_upserts: usize,
    pending_removes: usize,
}

#[derive(Serialize)]
struct NamespaceReport {
    namespace: String,
    collections: Vec<CollectionReport>,
}

/// Prints collections with live and journal counts.
pub async fn run(db: &Database, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Inspecting namespace {}", db.namespace());

    let mut collections = Vec::new();
    for name in db.collection_names().await? {
        let col = db.collection(&name).await?;
        collections.push(CollectionReport {
            live: col.count().await?,
            pending_upserts: col.pending_upserts().await?.len(),
            pending_removes: col.pending_removes().await?.len(),
            name,
        });
    }

    let report = NamespaceReport {
        namespace: db.namespace().to_string(),
        collections,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("namespace: {}", report.namespace);
            if report.collections.is_empty() {
                println!("  (no collections)");
            }
            for col in &report.collections {
                println!(
                    "  {:<24} live={:<6} pending_upserts={:<6} pending_removes={}",
                    col.name, col.live, col.pending_upserts, col.pending_removes
                );
            }
        }
    }

    Ok(())
}
