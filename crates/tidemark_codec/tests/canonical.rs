//! Property tests for canonical encoding.

use proptest::prelude::*;
use tidemark_codec::{from_cbor, to_canonical_cbor, Document, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e15f64..1.0e15).prop_map(Value::Float),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(Value::Text),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..4).prop_map(Value::map),
        ]
    })
}

proptest! {
    #[test]
    fn roundtrip(v in value()) {
        let bytes = to_canonical_cbor(&v).unwrap();
        prop_assert_eq!(from_cbor(&bytes).unwrap(), v);
    }

    #[test]
    fn encoding_is_deterministic(v in value()) {
        let first = to_canonical_cbor(&v).unwrap();
        let second = to_canonical_cbor(&v.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn document_roundtrip(id in "[a-z0-9]{1,12}", v in value()) {
        let doc = Document::new(id).with("payload", v);
        let bytes = doc.encode().unwrap();
        prop_assert_eq!(Document::decode(&bytes).unwrap(), doc);
    }
}
