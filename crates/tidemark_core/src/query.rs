//! Query predicates and the matching seam.

use tidemark_codec::{Document, Value};

/// A query predicate over documents.
///
/// The predicate is document-shaped - a set of field/value pairs - and
/// opaque to the store itself: only the configured [`QueryEvaluator`]
/// interprets it. The empty predicate matches every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    predicate: Document,
}

impl Query {
    /// The empty predicate: matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches documents whose `id` equals the given value.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().eq(tidemark_codec::ID_FIELD, Value::Text(id.into()))
    }

    /// Adds a field equality condition.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicate.set(field, value);
        self
    }

    /// Returns the predicate document.
    #[must_use]
    pub fn predicate(&self) -> &Document {
        &self.predicate
    }

    /// Returns true if this is the empty predicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }
}

impl From<Document> for Query {
    fn from(predicate: Document) -> Self {
        Self { predicate }
    }
}

/// Decides whether a document matches a predicate.
///
/// The store delegates all predicate interpretation here, so a caller
/// with a richer query language plugs it in via
/// [`Database::open_with_evaluator`](crate::Database::open_with_evaluator)
/// without touching the store.
pub trait QueryEvaluator: Send + Sync {
    /// Returns true if `doc` matches `query`.
    fn matches(&self, doc: &Document, query: &Query) -> bool;
}

/// The default evaluator: a conjunction of top-level field equalities.
///
/// An empty predicate matches every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldEvaluator;

impl QueryEvaluator for FieldEvaluator {
    fn matches(&self, doc: &Document, query: &Query) -> bool {
        query
            .predicate()
            .fields()
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Document {
        Document::new("1").with("name", "Alice").with("age", 30)
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(FieldEvaluator.matches(&alice(), &Query::all()));
        assert!(FieldEvaluator.matches(&Document::empty(), &Query::all()));
    }

    #[test]
    fn field_equality() {
        let query = Query::all().eq("name", "Alice");
        assert!(FieldEvaluator.matches(&alice(), &query));

        let query = Query::all().eq("name", "Bob");
        assert!(!FieldEvaluator.matches(&alice(), &query));
    }

    #[test]
    fn conjunction_requires_all_fields() {
        let query = Query::all().eq("name", "Alice").eq("age", 30);
        assert!(FieldEvaluator.matches(&alice(), &query));

        let query = Query::all().eq("name", "Alice").eq("age", 31);
        assert!(!FieldEvaluator.matches(&alice(), &query));
    }

    #[test]
    fn missing_field_does_not_match() {
        let query = Query::all().eq("city", "Berlin");
        assert!(!FieldEvaluator.matches(&alice(), &query));
    }

    #[test]
    fn by_id_matches_only_that_document() {
        assert!(FieldEvaluator.matches(&alice(), &Query::by_id("1")));
        assert!(!FieldEvaluator.matches(&alice(), &Query::by_id("2")));
    }
}
