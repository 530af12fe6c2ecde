//! Core types for tugindex.
//!
//! This crate provides the language-agnostic pieces shared by the indexing
//! engine and its callers:
//! - Semantic model input (documents, symbols, declarations, exports)
//! - Graph elements and the id counter used to emit them
//! - Source positions and ranges
//! - Error types and error codes

pub mod error;
pub mod graph;
pub mod model;
pub mod types;
