//! Schemaless document type.

use crate::error::{CodecError, CodecResult};
use crate::value::{canonical_key_cmp, Value};
use crate::{from_cbor, to_canonical_cbor};

/// Name of the mandatory identifier field.
pub const ID_FIELD: &str = "id";

/// A schemaless document: a text-keyed map of [`Value`]s.
///
/// Documents are what collections store. A storable document carries a
/// string `id` field; whether the field is present is checked by the
/// store at write time, not here, because query predicates share this
/// representation and have no id.
///
/// Fields are kept in canonical key order so that encoding a document
/// is deterministic without re-sorting.
///
/// # Example
///
/// ```
/// use tidemark_codec::{Document, Value};
///
/// let doc = Document::new("user-1")
///     .with("name", "Alice")
///     .with("age", 30);
///
/// assert_eq!(doc.id(), Some("user-1"));
/// assert_eq!(doc.get("name"), Some(&Value::Text("Alice".to_string())));
///
/// let bytes = doc.encode().unwrap();
/// assert_eq!(Document::decode(&bytes).unwrap(), doc);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Fields in canonical key order.
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Creates a document with the given id and no other fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            fields: vec![(ID_FIELD.to_string(), Value::Text(id.into()))],
        }
    }

    /// Creates an empty document with no fields (and thus no id).
    ///
    /// Useful for building query predicates; not storable as-is.
    #[must_use]
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Creates a document from field pairs.
    ///
    /// Pairs are sorted into canonical key order; on duplicate keys the
    /// last occurrence wins.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        match Value::map(pairs) {
            Value::Map(fields) => Self { fields },
            _ => unreachable!("Value::map always returns a map"),
        }
    }

    /// Returns the document id, if the `id` field is present and a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(Value::as_text)
    }

    /// Looks up a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .binary_search_by(|(k, _)| canonical_key_cmp(k, key))
            .ok()
            .map(|i| &self.fields[i].1)
    }

    /// Sets a field, replacing any existing value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self
            .fields
            .binary_search_by(|(k, _)| canonical_key_cmp(k, &key))
        {
            Ok(i) => self.fields[i].1 = value,
            Err(i) => self.fields.insert(i, (key, value)),
        }
    }

    /// Builder form of [`Document::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the fields in canonical key order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts this document into a map [`Value`].
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Map(self.fields)
    }

    /// Builds a document from a map [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a map.
    pub fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Map(fields) => Ok(Self::from_pairs(fields)),
            other => Err(CodecError::invalid_structure(format!(
                "document must be a map, got {other:?}"
            ))),
        }
    }

    /// Encodes this document to canonical CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a field contains a non-finite float.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(&Value::Map(self.fields.clone()))
    }

    /// Decodes a document from canonical CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid CBOR map.
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        Self::from_value(from_cbor(bytes)?)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}
