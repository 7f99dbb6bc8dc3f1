//! CLI command implementations.

pub mod compact;
pub mod inspect;
pub mod pending;

use tidemark_core::{Document, Value};

/// Renders a store value as JSON for display.
///
/// Byte strings become arrays of numbers; everything else maps
/// directly.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::Bytes(bytes) => serde_json::Value::Array(
            bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
        ),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(pairs) => serde_json::Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// Renders a document as a JSON object.
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    serde_json::Value::Object(
        doc.fields()
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_renders_as_object() {
        let doc = Document::new("1")
            .with("name", "Alice")
            .with("lat", 51.5)
            .with("active", true);

        let json = document_to_json(&doc);
        assert_eq!(json["id"], "1");
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["lat"], 51.5);
        assert_eq!(json["active"], true);
    }

    #[test]
    fn nested_values_render() {
        let value = Value::map(vec![
            ("tags".into(), Value::Array(vec!["a".into(), "b".into()])),
            ("blob".into(), Value::Bytes(vec![1, 2])),
            ("none".into(), Value::Null),
        ]);

        let json = value_to_json(&value);
        assert_eq!(json["tags"][0], "a");
        assert_eq!(json["blob"][1], 2);
        assert!(json["none"].is_null());
    }
}
