//! # Tidemark Testkit
//!
//! Test utilities for Tidemark.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A fault-injecting adapter for failure-path tests
//! - The cross-crate integration tests (under `tests/`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tidemark_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_store() {
//!     with_store(|db| async move {
//!         let collection = db.collection("test").await.unwrap();
//!         // ... test operations
//!     })
//!     .await;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
