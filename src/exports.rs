//! Export paths and export indirection.
//!
//! Before anything is emitted, [`ExportPlan::build`] walks every module in
//! pass order and works out which symbols are reachable from a module's
//! public surface, and under which identifier. A symbol keeps the first path
//! it is reached by. Members of an exported container are reachable when
//! they are themselves exported, to any depth: `a:RAL.console.warn`.
//!
//! Export statements (`export default foo`, `export = foo`,
//! `export { foo as bar }`, re-exports) do not give the target a path of its
//! own. Instead [`Indexer::indirect_export`] builds an outer node carrying
//! the export moniker with a `next` edge to the target's canonical node, and
//! repeats that for every exported member of the target. The canonical nodes
//! underneath get local monikers, which is why the plan also records the set
//! of indirected symbols.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::Result;
use crate::graph::MonikerKind;
use crate::indexer::Indexer;
use crate::model::{Document, DocumentId, ExportStatement, SemanticModel, Symbol, SymbolKey};
use crate::moniker::{export_identifier, ClaimOwner, ExportClaim, ExportSlot, MonikerContext};
use crate::nodes::{NodeId, NodeOrigin};
use crate::options::IndexOptions;
use crate::resolver::moniker_kind;

// ============================================================================
// Export Plan
// ============================================================================

/// Where a symbol is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPath {
    /// Module document the path starts from.
    pub document: DocumentId,
    /// Full export identifier, e.g. `a:N.x`.
    pub identifier: String,
}

/// Export paths and indirection targets, computed up front.
#[derive(Debug, Default)]
pub struct ExportPlan {
    paths: HashMap<SymbolKey, ExportPath>,
    owners: HashMap<String, SymbolKey>,
    indirected: HashSet<SymbolKey>,
    demoted: usize,
}

impl ExportPlan {
    /// Compute the plan for `documents`, which must be in pass order.
    pub fn build<M: SemanticModel>(
        model: &M,
        options: &IndexOptions,
        documents: &[&Document],
    ) -> Self {
        let mut plan = ExportPlan::default();
        for document in documents.iter().filter(|doc| doc.module) {
            let module = options.module_path(document);
            for decl in &document.declarations {
                let Some(symbol) = model.symbol(decl.symbol) else {
                    continue;
                };
                if symbol.exported && symbol.parent.is_none() {
                    plan.visit(model, document, &module, symbol, vec![symbol.name.clone()]);
                }
            }
            for export in &document.exports {
                if let Some(target) = model.symbol(export.target) {
                    plan.mark_indirected(model, target);
                }
            }
        }
        plan
    }

    fn visit<M: SemanticModel>(
        &mut self,
        model: &M,
        document: &Document,
        module: &str,
        symbol: &Symbol,
        segments: Vec<String>,
    ) {
        if self.paths.contains_key(&symbol.key) {
            return;
        }
        let identifier = export_identifier(module, &segments);
        match self.owners.get(&identifier) {
            Some(&owner) if owner != symbol.key => {
                if shares_merged_parent(model, owner, symbol) {
                    self.demoted += 1;
                    warn!(
                        identifier = %identifier,
                        demoted = %symbol.describe(),
                        document = %document.path,
                        "member export collides with an earlier declaration; keeping the first"
                    );
                    return;
                }
            }
            Some(_) => {}
            None => {
                self.owners.insert(identifier.clone(), symbol.key);
            }
        }
        self.paths.insert(
            symbol.key,
            ExportPath {
                document: document.id,
                identifier,
            },
        );

        for member in exported_members(model, symbol) {
            let mut path = segments.clone();
            path.push(member.name.clone());
            self.visit(model, document, module, member, path);
        }
    }

    fn mark_indirected<M: SemanticModel>(&mut self, model: &M, symbol: &Symbol) {
        if !self.indirected.insert(symbol.key) {
            return;
        }
        for member in exported_members(model, symbol) {
            self.mark_indirected(model, member);
        }
    }

    /// Export path of a symbol, if it is reachable from a module surface.
    pub fn path(&self, key: SymbolKey) -> Option<&ExportPath> {
        self.paths.get(&key)
    }

    /// Whether the symbol sits under an export statement.
    pub fn is_indirected(&self, key: SymbolKey) -> bool {
        self.indirected.contains(&key)
    }

    /// Members dropped because a merged sibling claimed the same path first.
    pub fn demoted(&self) -> usize {
        self.demoted
    }
}

/// Exported members of `symbol` across all of its declarations, in
/// declaration then member order, each symbol once.
pub fn exported_members<'m, M: SemanticModel>(model: &'m M, symbol: &Symbol) -> Vec<&'m Symbol> {
    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for declaration in &symbol.declarations {
        for member in &declaration.members {
            if member.symbol == symbol.key || !seen.insert(member.symbol) {
                continue;
            }
            if let Some(member_symbol) = model.symbol(member.symbol) {
                if member_symbol.exported {
                    members.push(member_symbol);
                }
            }
        }
    }
    members
}

/// Parent of `symbol` when that parent has more than one declaration.
pub fn merged_parent<M: SemanticModel>(model: &M, symbol: &Symbol) -> Option<SymbolKey> {
    symbol.parent.filter(|parent| {
        model
            .symbol(*parent)
            .is_some_and(|parent| parent.declarations.len() > 1)
    })
}

fn shares_merged_parent<M: SemanticModel>(model: &M, owner: SymbolKey, symbol: &Symbol) -> bool {
    let Some(parent) = merged_parent(model, symbol) else {
        return false;
    };
    model
        .symbol(owner)
        .is_some_and(|owner| owner.parent == Some(parent))
}

// ============================================================================
// Indirection
// ============================================================================

impl<'a, M: SemanticModel> Indexer<'a, M> {
    /// Build the outer nodes for one export statement of `document`.
    pub(crate) fn indirect_export(
        &mut self,
        document: &'a Document,
        export: &ExportStatement,
    ) -> Result<()> {
        let model = self.model;
        let Some(target) = model.symbol(export.target) else {
            self.skip(format_args!(
                "export of unknown {} in {}",
                export.target, document.path
            ));
            return Ok(());
        };
        let module = self.options.module_path(document);
        let kind = moniker_kind(document);
        let name = export.exported_name(target).to_string();
        let mut stack = Vec::new();
        self.indirect(document, &module, kind, target, vec![name], &mut stack)?;
        Ok(())
    }

    /// Give `symbol` an export face under `module:path`.
    ///
    /// Returns `(outer, inner)`. When the symbol already owns the identifier
    /// (directly or through an earlier statement) the existing node is the
    /// outer one; for a direct export that is the canonical node itself.
    /// Returns `None` for unresolvable and demoted symbols.
    pub(crate) fn indirect(
        &mut self,
        document: &Document,
        module: &str,
        kind: MonikerKind,
        symbol: &'a Symbol,
        path: Vec<String>,
        stack: &mut Vec<SymbolKey>,
    ) -> Result<Option<(NodeId, NodeId)>> {
        if stack.contains(&symbol.key) {
            return Ok(None);
        }
        let Some(inner) = self.resolve(symbol.key)? else {
            return Ok(None);
        };

        let model = self.model;
        let identifier = export_identifier(module, &path);
        let claim = ExportClaim {
            owner: ClaimOwner::Symbol(symbol.key),
            merged_parent: merged_parent(model, symbol),
            description: symbol.describe(),
            document: document.path.clone(),
        };
        let outer = match self.assigner.export_slot(&identifier, &claim)? {
            ExportSlot::Owned(existing) => return Ok(Some((existing, inner))),
            ExportSlot::Demoted => {
                self.assigner.demote(&identifier, &claim);
                return Ok(None);
            }
            ExportSlot::Free => {
                let outer = self.nodes.allocate(
                    &mut self.ids,
                    &mut self.graph,
                    NodeOrigin::Export {
                        symbol: symbol.key,
                        identifier: identifier.clone(),
                    },
                );
                self.nodes
                    .link(&mut self.ids, &mut self.graph, outer, inner)?;
                self.attach(
                    outer,
                    MonikerContext::Exported {
                        identifier,
                        kind,
                        claim,
                    },
                )?;
                self.stats.indirections += 1;
                outer
            }
        };

        stack.push(symbol.key);
        for member in exported_members(model, symbol) {
            let mut member_path = path.clone();
            member_path.push(member.name.clone());
            self.indirect(document, module, kind, member, member_path, stack)?;
        }
        stack.pop();

        Ok(Some((outer, inner)))
    }
}

// ============================================================================
// Tests
// ============================================================================
