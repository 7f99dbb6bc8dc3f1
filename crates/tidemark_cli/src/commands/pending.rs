//! Journal dump command.

use super::document_to_json;
use serde_json::json;
use tidemark_core::Database;
use tracing::info;

/// Dumps a collection's pending upserts and removes as JSON.
pub async fn run(db: &Database, collection: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Dumping journals for {}/{collection}", db.namespace());

    if !db
        .collection_names()
        .await?
        .iter()
        .any(|name| name == collection)
    {
        return Err(format!("no such collection: {collection}").into());
    }
    let col = db.collection(collection).await?;

    let upserts: Vec<serde_json::Value> = col
        .pending_upserts()
        .await?
        .iter()
        .map(|entry| {
            json!({
                "id": entry.id,
                "doc": document_to_json(&entry.doc),
                "base": entry.base.as_ref().map(document_to_json),
            })
        })
        .collect();

    let removes = col.pending_removes().await?;

    let report = json!({
        "collection": collection,
        "pending_upserts": upserts,
        "pending_removes": removes,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
