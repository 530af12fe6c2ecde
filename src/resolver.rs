//! Symbol identity resolution.
//!
//! Each symbol gets exactly one canonical node, allocated the first time the
//! pass meets it, whether through a declaration, a reference, or an export
//! statement. Declarations are bound to nodes in the order the pass visits
//! them:
//!
//! ```text
//! decl #2 node ──next──▶ decl #1 node ──next──▶ canonical node (monikers)
//! ```
//!
//! The first visited declaration binds to the canonical node itself, so a
//! symbol with a single declaration never gets a chain.

use std::collections::HashSet;

use crate::error::{IndexError, Result};
use crate::exports::merged_parent;
use crate::graph::{ElementId, MonikerKind};
use crate::indexer::Indexer;
use crate::model::{DeclRef, Document, SemanticModel, Symbol, SymbolKey};
use crate::moniker::{ClaimOwner, ExportClaim, ExportSlot, LocalKey, MonikerContext};
use crate::nodes::{NodeId, NodeOrigin};

impl<'a, M: SemanticModel> Indexer<'a, M> {
    /// Canonical node of `key`, allocating it on first use.
    ///
    /// Returns `None` when the model does not know the symbol.
    pub(crate) fn resolve(&mut self, key: SymbolKey) -> Result<Option<NodeId>> {
        if let Some(node) = self.nodes.canonical(key) {
            return Ok(Some(node));
        }
        let model = self.model;
        let Some(symbol) = model.symbol(key) else {
            self.skip(format_args!("unknown symbol {}", key));
            return Ok(None);
        };

        let node = self
            .nodes
            .allocate(&mut self.ids, &mut self.graph, NodeOrigin::Symbol(key));
        let context = self.moniker_context(symbol)?;
        self.attach(node, context)?;

        if self.referenced.contains(&key) {
            let vertex = self.node_vertex(node)?;
            self.aggregator
                .open(&mut self.ids, &mut self.graph, node, vertex);
        }
        Ok(Some(node))
    }

    /// Node for one physical declaration.
    pub(crate) fn resolve_declaration(&mut self, decl: DeclRef) -> Result<Option<NodeId>> {
        if let Some(node) = self.nodes.declaration_node(decl) {
            return Ok(Some(node));
        }
        let Some(canonical) = self.resolve(decl.symbol)? else {
            return Ok(None);
        };
        let node = match self.nodes.last_declaration(decl.symbol) {
            None => canonical,
            Some(previous) => {
                let node = self.nodes.allocate(
                    &mut self.ids,
                    &mut self.graph,
                    NodeOrigin::Declaration(decl),
                );
                self.nodes
                    .link(&mut self.ids, &mut self.graph, node, previous)?;
                node
            }
        };
        self.nodes.bind_declaration(decl, node);
        Ok(Some(node))
    }

    /// Root node of a module document, carrying the `<module>:` moniker.
    pub(crate) fn resolve_module(&mut self, document: &Document) -> Result<NodeId> {
        if let Some(node) = self.nodes.module_node(document.id) {
            return Ok(node);
        }
        let node = self.nodes.allocate(
            &mut self.ids,
            &mut self.graph,
            NodeOrigin::Module(document.id),
        );
        let context = MonikerContext::ModuleRoot {
            document: document.id,
            module: self.options.module_path(document),
            path: document.path.clone(),
            kind: moniker_kind(document),
        };
        self.attach(node, context)?;
        Ok(node)
    }

    /// Decide which moniker a symbol's canonical node gets.
    fn moniker_context(&mut self, symbol: &Symbol) -> Result<MonikerContext> {
        let model = self.model;
        if let Some(path) = self.plan.path(symbol.key) {
            let document = model.document(path.document).ok_or_else(|| {
                IndexError::invariant(format!("export path of {} has no document", symbol.key))
            })?;
            let identifier = path.identifier.clone();
            let claim = ExportClaim {
                owner: ClaimOwner::Symbol(symbol.key),
                merged_parent: merged_parent(model, symbol),
                description: symbol.describe(),
                document: document.path.clone(),
            };
            match self.assigner.export_slot(&identifier, &claim)? {
                ExportSlot::Free => {
                    return Ok(MonikerContext::Exported {
                        identifier,
                        kind: moniker_kind(document),
                        claim,
                    })
                }
                ExportSlot::Owned(node) => {
                    return Err(IndexError::invariant(format!(
                        "'{}' already owned by {} before {} was resolved",
                        identifier,
                        node,
                        symbol.describe()
                    )))
                }
                ExportSlot::Demoted => self.assigner.demote(&identifier, &claim),
            }
        }

        let home = symbol.home_document().and_then(|id| model.document(id));
        if home.is_some_and(|document| document.external) {
            return Ok(MonikerContext::Hidden);
        }
        if self.plan.is_indirected(symbol.key) || self.referenced.contains(&symbol.key) {
            return Ok(MonikerContext::Local {
                symbol: symbol.key,
                key: self.local_key(symbol)?,
            });
        }
        Ok(MonikerContext::Hidden)
    }

    /// Canonical local key: home document, dotted name through containers
    /// declared in the same document, kind.
    fn local_key(&self, symbol: &Symbol) -> Result<LocalKey> {
        let model = self.model;
        let home = symbol.home_document();
        let document = home.and_then(|id| model.document(id)).ok_or_else(|| {
            IndexError::invariant(format!("{} has no home document", symbol.describe()))
        })?;

        let mut names = vec![symbol.name.as_str()];
        let mut seen = HashSet::from([symbol.key]);
        let mut current = symbol.parent;
        while let Some(key) = current {
            if !seen.insert(key) {
                return Err(IndexError::ParentCycle {
                    symbol: symbol.describe(),
                });
            }
            let Some(parent) = model.symbol(key) else {
                break;
            };
            if parent.home_document() != home {
                break;
            }
            names.push(parent.name.as_str());
            current = parent.parent;
        }
        names.reverse();

        Ok(LocalKey::new(&document.path, names.join("."), symbol.kind))
    }

    /// Compute and attach the moniker for `node`.
    pub(crate) fn attach(&mut self, node: NodeId, context: MonikerContext) -> Result<()> {
        if let Some(data) = self.assigner.assign(node, context)? {
            self.nodes
                .attach_moniker(&mut self.ids, &mut self.graph, node, data)?;
            self.stats.monikers += 1;
        }
        Ok(())
    }

    pub(crate) fn node_vertex(&self, node: NodeId) -> Result<ElementId> {
        self.nodes
            .get(node)
            .map(|entry| entry.vertex)
            .ok_or_else(|| IndexError::invariant(format!("unknown {}", node)))
    }
}

/// Export for project documents, import for dependency files.
pub(crate) fn moniker_kind(document: &Document) -> MonikerKind {
    if document.external {
        MonikerKind::Import
    } else {
        MonikerKind::Export
    }
}
