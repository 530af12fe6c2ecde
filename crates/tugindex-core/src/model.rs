//! Semantic model: the resolved program the indexing engine consumes.
//!
//! Parsing, binding and alias-following happen upstream. By the time a
//! [`Program`] reaches the engine every identifier has been resolved to a
//! [`Symbol`], and every symbol knows its declarations and the sites that
//! reference it.
//!
//! - [`Document`]: a source file with its top-level declarations and exports
//! - [`Symbol`]: one logical program entity (possibly declared several times)
//! - [`Declaration`]: one physical declaration of a symbol, with nested members
//! - [`ExportStatement`]: an export form that may alias its target
//! - [`ReferenceSite`]: a usage of a symbol somewhere in the program
//!
//! The engine reads the model through the [`SemanticModel`] trait. [`Program`]
//! is the in-memory implementation, assembled with [`ProgramBuilder`].
//!
//! # Declaration References
//!
//! Declarations are addressed by [`DeclRef`] (symbol key + declaration index)
//! rather than by pointer, so a merged symbol's declarations can live in
//! different documents and different containers without shared ownership.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::types::Range;

// ============================================================================
// ID Types
// ============================================================================

/// Position of a document within its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

impl DocumentId {
    /// Create a new document ID.
    pub fn new(id: u32) -> Self {
        DocumentId(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc_{}", self.0)
    }
}

/// Stable identity of a logical symbol, assigned by the semantic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct SymbolKey(pub u32);

impl SymbolKey {
    /// Create a new symbol key.
    pub fn new(id: u32) -> Self {
        SymbolKey(id)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym_{}", self.0)
    }
}

/// Address of one physical declaration: `symbol.declarations[index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct DeclRef {
    pub symbol: SymbolKey,
    pub index: usize,
}

impl DeclRef {
    /// Create a new declaration reference.
    pub fn new(symbol: SymbolKey, index: usize) -> Self {
        DeclRef { symbol, index }
    }
}

impl fmt::Display for DeclRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.symbol, self.index)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Kind of symbol declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Module,
    Namespace,
    Class,
    Interface,
    Function,
    Method,
    Property,
    Variable,
    Constant,
    Enum,
    EnumMember,
    TypeAlias,
}

impl SymbolKind {
    /// Stable lowercase name, used in canonical moniker keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum_member",
            SymbolKind::TypeAlias => "type_alias",
        }
    }

    /// LSP `SymbolKind` number carried on definition range tags.
    pub fn lsp_kind(&self) -> u32 {
        match self {
            SymbolKind::Module => 2,
            SymbolKind::Namespace => 3,
            SymbolKind::Class => 5,
            SymbolKind::Method => 6,
            SymbolKind::Property => 7,
            SymbolKind::Enum => 10,
            SymbolKind::Interface => 11,
            SymbolKind::Function => 12,
            SymbolKind::Variable => 13,
            SymbolKind::Constant => 14,
            SymbolKind::EnumMember => 22,
            SymbolKind::TypeAlias => 26,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// A plain usage (read, call, type position).
    #[default]
    Reference,
    /// An import binding that re-binds the symbol's name locally
    /// (`import { foo } from "./a"`).
    Import,
}

/// The syntactic form of an export statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportForm {
    /// `export default expr`
    Default,
    /// `export = expr`
    Assignment,
    /// `export { name }` or `export { name as alias }`, optionally `from` another module.
    Named { alias: Option<String> },
}

// ============================================================================
// Model Tables
// ============================================================================

/// One physical declaration of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Document containing the declaration.
    pub document: DocumentId,
    /// Range of the declared name.
    pub range: Range,
    /// Range of the whole declaration.
    pub full_range: Range,
    /// Member declarations nested in this one, in source order.
    pub members: Vec<DeclRef>,
}

impl Declaration {
    /// Create a declaration whose full range equals its name range.
    pub fn new(document: DocumentId, range: Range) -> Self {
        Declaration {
            document,
            range,
            full_range: range,
            members: Vec::new(),
        }
    }

    /// Set the full declaration range.
    pub fn with_full_range(mut self, full_range: Range) -> Self {
        self.full_range = full_range;
        self
    }
}

/// A usage of a symbol somewhere in the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSite {
    /// Document containing the usage.
    pub document: DocumentId,
    /// Range of the referencing identifier.
    pub range: Range,
    /// Kind of usage.
    pub kind: ReferenceKind,
}

impl ReferenceSite {
    /// Create a plain reference site.
    pub fn new(document: DocumentId, range: Range) -> Self {
        ReferenceSite {
            document,
            range,
            kind: ReferenceKind::Reference,
        }
    }

    /// Create an import-binding site.
    pub fn import(document: DocumentId, range: Range) -> Self {
        ReferenceSite {
            document,
            range,
            kind: ReferenceKind::Import,
        }
    }
}

/// A logical program entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable key assigned by the semantic model.
    pub key: SymbolKey,
    /// Kind of the symbol (taken from its first declaration).
    pub kind: SymbolKind,
    /// Declared name.
    pub name: String,
    /// Physical declarations in discovery order.
    pub declarations: Vec<Declaration>,
    /// Exported at module scope, or visible from its container for members.
    pub exported: bool,
    /// Containing namespace, interface, class or object type.
    pub parent: Option<SymbolKey>,
    /// Usages of the symbol, already resolved across aliases.
    pub references: Vec<ReferenceSite>,
}

impl Symbol {
    /// Create a new symbol with no declarations.
    pub fn new(key: SymbolKey, kind: SymbolKind, name: impl Into<String>) -> Self {
        Symbol {
            key,
            kind,
            name: name.into(),
            declarations: Vec::new(),
            exported: false,
            parent: None,
            references: Vec::new(),
        }
    }

    /// Document of the first declaration, if any.
    pub fn home_document(&self) -> Option<DocumentId> {
        self.declarations.first().map(|decl| decl.document)
    }

    /// Short human-readable label for logs and errors.
    pub fn describe(&self) -> String {
        format!("{} {} ({})", self.kind, self.name, self.key)
    }
}

/// An export statement in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStatement {
    /// Syntactic form.
    pub form: ExportForm,
    /// The exported symbol, possibly declared in another document.
    pub target: SymbolKey,
}

impl ExportStatement {
    /// `export default target`
    pub fn default_export(target: SymbolKey) -> Self {
        ExportStatement {
            form: ExportForm::Default,
            target,
        }
    }

    /// `export = target`
    pub fn assignment(target: SymbolKey) -> Self {
        ExportStatement {
            form: ExportForm::Assignment,
            target,
        }
    }

    /// `export { target }`
    pub fn named(target: SymbolKey) -> Self {
        ExportStatement {
            form: ExportForm::Named { alias: None },
            target,
        }
    }

    /// `export { target as alias }`
    pub fn aliased(target: SymbolKey, alias: impl Into<String>) -> Self {
        ExportStatement {
            form: ExportForm::Named {
                alias: Some(alias.into()),
            },
            target,
        }
    }

    /// The name this statement exposes for `target`.
    ///
    /// Only an explicit alias renames; default and assignment exports of an
    /// identifier expose the identifier's declared name.
    pub fn exported_name<'a>(&'a self, target: &'a Symbol) -> &'a str {
        match &self.form {
            ExportForm::Named { alias: Some(alias) } => alias,
            _ => &target.name,
        }
    }
}

/// A source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Position in the program (assigned by [`ProgramBuilder`]).
    pub id: DocumentId,
    /// Absolute or root-relative path.
    pub path: String,
    /// Language identifier for the document vertex.
    pub language_id: String,
    /// Whether the file uses module syntax (has imports or exports).
    pub module: bool,
    /// Declaration file from a dependency rather than project source.
    pub external: bool,
    /// Explicit module name, overriding the path-derived one.
    pub module_name: Option<String>,
    /// Top-level declarations in source order.
    pub declarations: Vec<DeclRef>,
    /// Export statements in source order.
    pub exports: Vec<ExportStatement>,
}

impl Document {
    /// Create a new script document (no module syntax).
    pub fn new(path: impl Into<String>) -> Self {
        Document {
            id: DocumentId::new(0),
            path: path.into(),
            language_id: "typescript".to_string(),
            module: false,
            external: false,
            module_name: None,
            declarations: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Mark the document as a module.
    pub fn as_module(mut self) -> Self {
        self.module = true;
        self
    }

    /// Mark the document as an external dependency file.
    pub fn as_external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Set an explicit module name.
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Set the language identifier.
    pub fn with_language_id(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }
}

// ============================================================================
// Semantic Model Trait
// ============================================================================

/// Read-only view of a resolved program.
///
/// Implementations must be fully resolved before the pass starts; the engine
/// performs no I/O and never asks the model to resolve anything lazily.
pub trait SemanticModel {
    /// All documents, in program order.
    fn documents(&self) -> &[Document];

    /// All symbols, in key order.
    fn symbols(&self) -> impl Iterator<Item = &Symbol>;

    /// Look up a symbol by key.
    fn symbol(&self, key: SymbolKey) -> Option<&Symbol>;

    /// Look up a document by id.
    fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents().iter().find(|doc| doc.id == id)
    }

    /// Look up a declaration by reference.
    fn declaration(&self, decl: DeclRef) -> Option<&Declaration> {
        self.symbol(decl.symbol)?.declarations.get(decl.index)
    }
}

/// In-memory resolved program.
///
/// Only [`ProgramBuilder::build`] produces one, so document ids always match
/// their positions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Program {
    documents: Vec<Document>,
    symbols: BTreeMap<SymbolKey, Symbol>,
}

impl SemanticModel for Program {
    fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    fn symbol(&self, key: SymbolKey) -> Option<&Symbol> {
        self.symbols.get(&key)
    }

    fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents
            .get(id.0 as usize)
            .filter(|document| document.id == id)
    }
}

// ============================================================================
// Program Builder
// ============================================================================

/// Incremental builder for [`Program`].
///
/// Builder methods never fail; inconsistencies (unknown keys, bad member
/// wiring, parent cycles) are reported by [`ProgramBuilder::build`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    documents: Vec<Document>,
    symbols: BTreeMap<SymbolKey, Symbol>,
    problems: Vec<String>,
    next_symbol_key: u32,
}

impl ProgramBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        ProgramBuilder::default()
    }

    /// Add a document, assigning its id.
    pub fn add_document(&mut self, mut document: Document) -> DocumentId {
        let id = DocumentId::new(self.documents.len() as u32);
        document.id = id;
        self.documents.push(document);
        id
    }

    /// Add a symbol, assigning its key.
    pub fn add_symbol(&mut self, kind: SymbolKind, name: impl Into<String>) -> SymbolKey {
        let key = SymbolKey::new(self.next_symbol_key);
        self.next_symbol_key += 1;
        self.symbols.insert(key, Symbol::new(key, kind, name));
        key
    }

    /// Mark a symbol as exported from its module or container.
    pub fn export_symbol(&mut self, key: SymbolKey) {
        match self.symbols.get_mut(&key) {
            Some(symbol) => symbol.exported = true,
            None => self.problems.push(format!("export_symbol: unknown {}", key)),
        }
    }

    /// Add a top-level declaration of `key` to its document.
    pub fn declare(&mut self, key: SymbolKey, declaration: Declaration) -> DeclRef {
        let document = declaration.document;
        let decl = self.push_declaration(key, declaration);
        match self.documents.get_mut(document.0 as usize) {
            Some(doc) => doc.declarations.push(decl),
            None => self
                .problems
                .push(format!("declare: {} is not a document", document)),
        }
        decl
    }

    /// Add a declaration of `key` nested inside `container`.
    ///
    /// Sets `key`'s parent to the container's symbol.
    pub fn declare_member(
        &mut self,
        container: DeclRef,
        key: SymbolKey,
        declaration: Declaration,
    ) -> DeclRef {
        let decl = self.push_declaration(key, declaration);
        if let Some(symbol) = self.symbols.get_mut(&key) {
            match symbol.parent {
                Some(parent) if parent != container.symbol => self.problems.push(format!(
                    "declare_member: {} already belongs to {}",
                    key, parent
                )),
                _ => symbol.parent = Some(container.symbol),
            }
        }
        match self
            .symbols
            .get_mut(&container.symbol)
            .and_then(|symbol| symbol.declarations.get_mut(container.index))
        {
            Some(container_decl) => container_decl.members.push(decl),
            None => self
                .problems
                .push(format!("declare_member: unknown container {}", container)),
        }
        decl
    }

    /// Add an export statement to a document.
    pub fn add_export(&mut self, document: DocumentId, export: ExportStatement) {
        match self.documents.get_mut(document.0 as usize) {
            Some(doc) => doc.exports.push(export),
            None => self
                .problems
                .push(format!("add_export: {} is not a document", document)),
        }
    }

    /// Record a usage of `key`.
    pub fn add_reference(&mut self, key: SymbolKey, site: ReferenceSite) {
        match self.symbols.get_mut(&key) {
            Some(symbol) => symbol.references.push(site),
            None => self.problems.push(format!("add_reference: unknown {}", key)),
        }
    }

    /// Validate and produce the program.
    pub fn build(self) -> Result<Program> {
        if let Some(problem) = self.problems.first() {
            return Err(IndexError::invalid_program(problem.clone()));
        }

        let mut paths = HashSet::new();
        for doc in &self.documents {
            if !paths.insert(doc.path.as_str()) {
                return Err(IndexError::invalid_program(format!(
                    "duplicate document path {}",
                    doc.path
                )));
            }
        }

        for symbol in self.symbols.values() {
            if symbol.declarations.is_empty() {
                return Err(IndexError::invalid_program(format!(
                    "{} has no declarations",
                    symbol.describe()
                )));
            }
            for decl in &symbol.declarations {
                if decl.document.0 as usize >= self.documents.len() {
                    return Err(IndexError::invalid_program(format!(
                        "{} is declared in unknown {}",
                        symbol.describe(),
                        decl.document
                    )));
                }
                if !decl.full_range.contains(&decl.range) {
                    return Err(IndexError::invalid_program(format!(
                        "{} has a name range outside its full range",
                        symbol.describe()
                    )));
                }
            }
            check_parent_chain(&self.symbols, symbol)?;
        }

        Ok(Program {
            documents: self.documents,
            symbols: self.symbols,
        })
    }

    fn push_declaration(&mut self, key: SymbolKey, declaration: Declaration) -> DeclRef {
        match self.symbols.get_mut(&key) {
            Some(symbol) => {
                symbol.declarations.push(declaration);
                DeclRef::new(key, symbol.declarations.len() - 1)
            }
            None => {
                self.problems.push(format!("declare: unknown {}", key));
                DeclRef::new(key, 0)
            }
        }
    }
}

fn check_parent_chain(symbols: &BTreeMap<SymbolKey, Symbol>, symbol: &Symbol) -> Result<()> {
    let mut seen = HashSet::new();
    seen.insert(symbol.key);
    let mut current = symbol.parent;
    while let Some(key) = current {
        if !seen.insert(key) {
            return Err(IndexError::ParentCycle {
                symbol: symbol.describe(),
            });
        }
        current = symbols.get(&key).and_then(|parent| parent.parent);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn name_range() -> Range {
        Range::on_line(0, 9, 12)
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn assigns_sequential_ids() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let c = b.add_document(Document::new("/src/c.ts"));
            assert_eq!(a, DocumentId::new(0));
            assert_eq!(c, DocumentId::new(1));

            let foo = b.add_symbol(SymbolKind::Function, "foo");
            let bar = b.add_symbol(SymbolKind::Function, "bar");
            assert_eq!(foo, SymbolKey::new(0));
            assert_eq!(bar, SymbolKey::new(1));
        }

        #[test]
        fn declare_records_top_level_order() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts").as_module());
            let foo = b.add_symbol(SymbolKind::Function, "foo");
            let bar = b.add_symbol(SymbolKind::Variable, "bar");
            let d1 = b.declare(bar, Declaration::new(a, Range::on_line(0, 6, 9)));
            let d2 = b.declare(foo, Declaration::new(a, Range::on_line(1, 9, 12)));
            let program = b.build().unwrap();

            let doc = program.document(a).unwrap();
            assert_eq!(doc.declarations, vec![d1, d2]);
            assert!(doc.module);
        }

        #[test]
        fn merged_declarations_get_distinct_indices() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let ral = b.add_symbol(SymbolKind::Interface, "RAL");
            let first = b.declare(ral, Declaration::new(a, Range::on_line(0, 10, 13)));
            let second = b.declare(ral, Declaration::new(a, Range::on_line(1, 10, 13)));
            assert_eq!(first, DeclRef::new(ral, 0));
            assert_eq!(second, DeclRef::new(ral, 1));

            let program = b.build().unwrap();
            assert_eq!(program.symbol(ral).unwrap().declarations.len(), 2);
            assert!(program.declaration(second).is_some());
            assert!(program.declaration(DeclRef::new(ral, 2)).is_none());
        }

        #[test]
        fn declare_member_sets_parent_and_members() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let ns = b.add_symbol(SymbolKind::Namespace, "N");
            let x = b.add_symbol(SymbolKind::Constant, "x");
            let ns_decl = b.declare(ns, Declaration::new(a, Range::on_line(0, 10, 11)));
            let x_decl = b.declare_member(ns_decl, x, Declaration::new(a, Range::on_line(0, 27, 28)));
            let program = b.build().unwrap();

            assert_eq!(program.symbol(x).unwrap().parent, Some(ns));
            assert_eq!(program.declaration(ns_decl).unwrap().members, vec![x_decl]);
            // Members are not top-level declarations.
            assert_eq!(program.document(a).unwrap().declarations, vec![ns_decl]);
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn rejects_symbol_without_declarations() {
            let mut b = ProgramBuilder::new();
            b.add_document(Document::new("/src/a.ts"));
            b.add_symbol(SymbolKind::Function, "orphan");
            let err = b.build().unwrap_err();
            assert!(matches!(err, IndexError::InvalidProgram { .. }));
        }

        #[test]
        fn rejects_unknown_document() {
            let mut b = ProgramBuilder::new();
            let foo = b.add_symbol(SymbolKind::Function, "foo");
            b.declare(foo, Declaration::new(DocumentId::new(7), name_range()));
            assert!(b.build().is_err());
        }

        #[test]
        fn rejects_duplicate_paths() {
            let mut b = ProgramBuilder::new();
            b.add_document(Document::new("/src/a.ts"));
            b.add_document(Document::new("/src/a.ts"));
            let err = b.build().unwrap_err();
            assert!(err.to_string().contains("duplicate document path"));
        }

        #[test]
        fn rejects_member_with_two_parents() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let n = b.add_symbol(SymbolKind::Namespace, "N");
            let m = b.add_symbol(SymbolKind::Namespace, "M");
            let x = b.add_symbol(SymbolKind::Constant, "x");
            let n_decl = b.declare(n, Declaration::new(a, name_range()));
            let m_decl = b.declare(m, Declaration::new(a, name_range()));
            b.declare_member(n_decl, x, Declaration::new(a, name_range()));
            b.declare_member(m_decl, x, Declaration::new(a, name_range()));
            assert!(b.build().is_err());
        }

        #[test]
        fn rejects_parent_cycles() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let n = b.add_symbol(SymbolKind::Namespace, "N");
            let m = b.add_symbol(SymbolKind::Namespace, "M");
            let n_decl = b.declare(n, Declaration::new(a, name_range()));
            let m_decl = b.declare_member(n_decl, m, Declaration::new(a, name_range()));
            b.declare_member(m_decl, n, Declaration::new(a, name_range()));
            let err = b.build().unwrap_err();
            assert!(matches!(err, IndexError::ParentCycle { .. }));
        }

        #[test]
        fn rejects_reference_to_unknown_symbol() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            b.add_reference(SymbolKey::new(42), ReferenceSite::new(a, name_range()));
            assert!(b.build().is_err());
        }

        #[test]
        fn rejects_name_range_outside_full_range() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let foo = b.add_symbol(SymbolKind::Function, "foo");
            b.declare(
                foo,
                Declaration::new(a, Range::on_line(3, 9, 12)).with_full_range(name_range()),
            );
            let err = b.build().unwrap_err();
            assert!(err.to_string().contains("outside its full range"));
        }

        #[test]
        fn document_lookup_follows_ids() {
            let mut b = ProgramBuilder::new();
            let a = b.add_document(Document::new("/src/a.ts"));
            let other = b.add_document(Document::new("/src/b.ts"));
            let program = b.build().unwrap();
            assert_eq!(program.document(a).unwrap().path, "/src/a.ts");
            assert_eq!(program.document(other).unwrap().path, "/src/b.ts");
            assert!(program.document(DocumentId::new(2)).is_none());
        }
    }

    mod export_tests {
        use super::*;

        #[test]
        fn exported_name_uses_alias_only_for_named_exports() {
            let foo = Symbol::new(SymbolKey::new(0), SymbolKind::Function, "_foo");
            assert_eq!(
                ExportStatement::default_export(foo.key).exported_name(&foo),
                "_foo"
            );
            assert_eq!(
                ExportStatement::assignment(foo.key).exported_name(&foo),
                "_foo"
            );
            assert_eq!(ExportStatement::named(foo.key).exported_name(&foo), "_foo");
            assert_eq!(
                ExportStatement::aliased(foo.key, "foo").exported_name(&foo),
                "foo"
            );
        }

        #[test]
        fn symbol_kind_names_are_stable() {
            assert_eq!(SymbolKind::EnumMember.as_str(), "enum_member");
            assert_eq!(SymbolKind::Function.lsp_kind(), 12);
            assert_eq!(
                serde_json::to_string(&SymbolKind::TypeAlias).unwrap(),
                "\"type_alias\""
            );
        }
    }
}
