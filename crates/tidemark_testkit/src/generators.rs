//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random documents that satisfy the
//! store's invariants (string ids, finite floats).

use proptest::prelude::*;
use tidemark_codec::{Document, Value};

/// Strategy for generating valid document ids.
pub fn document_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,12}").expect("Invalid regex")
}

/// Strategy for generating field names (never the reserved `id`).
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}")
        .expect("Invalid regex")
        .prop_filter("field name must not be id", |name| name != "id")
}

/// Strategy for generating scalar field values.
///
/// Floats are drawn from a finite range; NaN and infinities are not
/// representable in a stored document.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e12f64..1.0e12).prop_map(Value::Float),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,16}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

/// Strategy for generating arbitrarily nested field values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..4)
                .prop_map(Value::map),
        ]
    })
}

/// Strategy for generating storable documents.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    (
        document_id_strategy(),
        prop::collection::vec((field_name_strategy(), value_strategy()), 0..5),
    )
        .prop_map(|(id, fields)| {
            let mut doc = Document::new(id);
            for (name, value) in fields {
                doc.set(name, value);
            }
            doc
        })
}

/// Strategy for generating a bulk-write batch of documents.
///
/// Ids may repeat within a batch, which is exactly what the journal's
/// fold-in-call-order behavior has to handle.
pub fn document_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(document_strategy(), 1..max_len.max(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_documents_are_storable(doc in document_strategy()) {
            prop_assert!(doc.id().is_some());
            let bytes = doc.encode().unwrap();
            prop_assert_eq!(Document::decode(&bytes).unwrap(), doc);
        }

        #[test]
        fn generated_values_encode(value in value_strategy()) {
            prop_assert!(!value.has_non_finite());
            tidemark_codec::to_canonical_cbor(&value).unwrap();
        }

        #[test]
        fn field_names_never_shadow_id(name in field_name_strategy()) {
            prop_assert_ne!(name, "id");
        }
    }
}
