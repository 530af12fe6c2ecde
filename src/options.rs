//! Index configuration.
//!
//! Options are plain data with serde support so a driver can load them from a
//! JSON config file. Every field has a default; a config only needs to name
//! what it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::model::Document;

/// Moniker scheme used when none is configured.
pub const DEFAULT_SCHEME: &str = "tsc";

/// Source extensions stripped when deriving a module path.
///
/// Declaration-file suffixes come first so `a.d.ts` maps to `a`, not `a.d`.
const SOURCE_EXTENSIONS: &[&str] = &[
    ".d.ts", ".d.mts", ".d.cts", ".tsx", ".ts", ".mts", ".cts", ".jsx", ".js", ".mjs", ".cjs",
];

/// Configuration for one indexing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Project root; module paths are computed relative to it.
    pub root_dir: String,
    /// Moniker scheme written on every moniker vertex.
    pub scheme: String,
    /// Kind recorded on the project vertex.
    pub project_kind: String,
    /// Emit `contains` edges (project → documents, document → ranges).
    pub emit_contains: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            root_dir: String::new(),
            scheme: DEFAULT_SCHEME.to_string(),
            project_kind: "typescript".to_string(),
            emit_contains: true,
        }
    }
}

impl IndexOptions {
    /// Default options rooted at `root_dir`.
    pub fn new(root_dir: impl Into<String>) -> Self {
        IndexOptions {
            root_dir: root_dir.into(),
            ..IndexOptions::default()
        }
    }

    /// Parse and validate options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: IndexOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options can produce well-formed monikers.
    pub fn validate(&self) -> Result<()> {
        if self.scheme.is_empty() {
            return Err(IndexError::invalid_options("scheme must not be empty"));
        }
        if self.scheme.contains(char::is_whitespace) {
            return Err(IndexError::invalid_options(format!(
                "scheme '{}' must not contain whitespace",
                self.scheme
            )));
        }
        if self.project_kind.is_empty() {
            return Err(IndexError::invalid_options("project_kind must not be empty"));
        }
        Ok(())
    }

    /// Module path used as the prefix of export monikers.
    ///
    /// An explicit module name wins. Otherwise the document path is made
    /// relative to `root_dir` and its source extension is dropped:
    /// `/@test/lib/a.ts` under `/@test` becomes `lib/a`.
    pub fn module_path(&self, document: &Document) -> String {
        if let Some(name) = &document.module_name {
            return name.clone();
        }
        let root = self.root_dir.trim_end_matches('/');
        let relative = if root.is_empty() {
            document.path.as_str()
        } else {
            document
                .path
                .strip_prefix(root)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(&document.path)
        };
        strip_source_extension(relative.trim_start_matches('/')).to_string()
    }

    /// URI of the project root for the metadata vertex.
    pub fn root_uri(&self) -> String {
        to_uri(&self.root_dir)
    }
}

/// Turn a path into a `file://` URI; non-absolute paths pass through.
pub fn to_uri(path: &str) -> String {
    if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        path.to_string()
    }
}

fn strip_source_extension(path: &str) -> &str {
    SOURCE_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path)
}

// ============================================================================
// Tests
// ============================================================================
