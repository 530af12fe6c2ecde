//! tugindex: moniker and export-identity resolution for graph-based code indexes.
//!
//! Takes a fully resolved program (see [`model`]) and produces the identity
//! part of a code-navigation graph: one canonical node per symbol, export
//! monikers for everything reachable from a module's public surface, local
//! monikers for internal symbols that still need an identity, and reference
//! results that unify usages across documents.
//!
//! ```
//! use tugindex::model::{Declaration, Document, ProgramBuilder, SymbolKind};
//! use tugindex::types::Range;
//! use tugindex::{index_program, IndexOptions};
//!
//! let mut b = ProgramBuilder::new();
//! let a = b.add_document(Document::new("/@test/a.ts").as_module());
//! let x = b.add_symbol(SymbolKind::Variable, "x");
//! b.export_symbol(x);
//! b.declare(x, Declaration::new(a, Range::on_line(0, 13, 14)));
//! let program = b.build().unwrap();
//!
//! let output = index_program(&program, &IndexOptions::new("/@test")).unwrap();
//! assert!(output.graph.moniker_by_identifier("a:").is_some());
//! assert!(output.graph.moniker_by_identifier("a:x").is_some());
//! ```

// Core types - re-exported from tugindex-core
pub use tugindex_core::error;
pub use tugindex_core::graph;
pub use tugindex_core::model;
pub use tugindex_core::types;

// Engine
pub mod exports;
pub mod indexer;
pub mod moniker;
pub mod nodes;
pub mod options;
pub mod references;
pub mod resolver;

pub use indexer::{index_program, IndexOutput, IndexStats, Indexer};
pub use options::IndexOptions;
