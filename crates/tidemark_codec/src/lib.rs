//! # Tidemark Codec
//!
//! Document model and canonical CBOR encoding for Tidemark.
//!
//! This crate provides deterministic CBOR encoding that ensures:
//! - Identical documents produce identical bytes
//! - Cross-platform consistency
//! - Stable bytewise comparison
//!
//! ## Canonical rules
//!
//! - Maps have text keys, sorted length-first then bytewise
//! - Integers use shortest encoding
//! - Floats always use the 64-bit form; NaN and infinities are forbidden
//! - Strings must be UTF-8
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use tidemark_codec::{Document, Value};
//!
//! let doc = Document::new("user-1").with("name", "Alice");
//! let bytes = doc.encode().unwrap();
//! let decoded = Document::decode(&bytes).unwrap();
//! assert_eq!(decoded, doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod document;
mod encoder;
mod error;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use document::{Document, ID_FIELD};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{canonical_key_cmp, Value};
