//! Identity node table: an arena of result-set nodes joined by `next` links.
//!
//! Every logical identity in the graph is an [`IdentityNode`] backed by one
//! `resultSet` vertex. Nodes never point at each other through shared
//! ownership; a node only records the id of the node its `next` edge leads to.
//! Following `next` links from any node ends at its terminal node, the one
//! that carries identity for reference aggregation.
//!
//! The table keeps lookup indexes for the four ways a node comes into being:
//! - a module root ([`NodeOrigin::Module`])
//! - the canonical node of a symbol ([`NodeOrigin::Symbol`])
//! - a further physical declaration of a merged symbol ([`NodeOrigin::Declaration`])
//! - the export face of a symbol under some identifier ([`NodeOrigin::Export`])

use std::collections::HashMap;
use std::fmt;

use crate::error::{IndexError, Result};
use crate::graph::{Edge, ElementId, Graph, IdCounter, MonikerData, MonikerKind, Vertex};
use crate::model::{DeclRef, DocumentId, SymbolKey};

/// Index of a node in the [`NodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Why a node exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOrigin {
    /// Root of a module document.
    Module(DocumentId),
    /// Canonical identity of a symbol.
    Symbol(SymbolKey),
    /// A non-first physical declaration of a symbol.
    Declaration(DeclRef),
    /// Export face of a symbol under `identifier`.
    Export {
        symbol: SymbolKey,
        identifier: String,
    },
}

/// One identity node.
#[derive(Debug, Clone)]
pub struct IdentityNode {
    pub id: NodeId,
    /// The `resultSet` vertex backing this node.
    pub vertex: ElementId,
    pub origin: NodeOrigin,
    /// Node this one chains toward.
    pub next: Option<NodeId>,
    monikers: Vec<(MonikerKind, ElementId)>,
}

impl IdentityNode {
    /// Moniker vertex of the given kind, if attached.
    pub fn moniker(&self, kind: MonikerKind) -> Option<ElementId> {
        self.monikers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, vertex)| *vertex)
    }

    /// All attached monikers in attachment order.
    pub fn monikers(&self) -> &[(MonikerKind, ElementId)] {
        &self.monikers
    }
}

/// Arena of identity nodes.
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: Vec<IdentityNode>,
    by_module: HashMap<DocumentId, NodeId>,
    by_symbol: HashMap<SymbolKey, NodeId>,
    by_declaration: HashMap<DeclRef, NodeId>,
    /// symbol → node of the most recently resolved declaration.
    last_declaration: HashMap<SymbolKey, NodeId>,
    by_export: HashMap<(SymbolKey, String), NodeId>,
}

impl NodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        NodeTable::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Allocate a node and emit its `resultSet` vertex.
    pub fn allocate(
        &mut self,
        ids: &mut IdCounter,
        graph: &mut Graph,
        origin: NodeOrigin,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let vertex = graph.add_vertex(ids, Vertex::ResultSet {});

        match &origin {
            NodeOrigin::Module(doc) => {
                self.by_module.insert(*doc, id);
            }
            NodeOrigin::Symbol(key) => {
                self.by_symbol.insert(*key, id);
            }
            NodeOrigin::Declaration(decl) => {
                self.by_declaration.insert(*decl, id);
            }
            NodeOrigin::Export { symbol, identifier } => {
                self.by_export.insert((*symbol, identifier.clone()), id);
            }
        }

        self.nodes.push(IdentityNode {
            id,
            vertex,
            origin,
            next: None,
            monikers: Vec::new(),
        });
        id
    }

    /// Link `from` toward `to` and emit the `next` edge.
    ///
    /// A node has at most one outgoing link, and a link may not close a cycle.
    pub fn link(
        &mut self,
        ids: &mut IdCounter,
        graph: &mut Graph,
        from: NodeId,
        to: NodeId,
    ) -> Result<ElementId> {
        let from_vertex = self.node(from)?.vertex;
        let to_vertex = self.node(to)?.vertex;
        if let Some(existing) = self.node(from)?.next {
            return Err(IndexError::invariant(format!(
                "{} already links to {}",
                from, existing
            )));
        }
        if self.terminal(to) == from {
            return Err(IndexError::invariant(format!(
                "linking {} to {} would create a cycle",
                from, to
            )));
        }
        self.nodes[from.0 as usize].next = Some(to);
        Ok(graph.add_edge(
            ids,
            Edge::Next {
                out_v: from_vertex,
                in_v: to_vertex,
            },
        ))
    }

    /// Emit a moniker vertex and attach it to `node`.
    ///
    /// A node carries at most one moniker per kind, and never both an export
    /// and a local moniker.
    pub fn attach_moniker(
        &mut self,
        ids: &mut IdCounter,
        graph: &mut Graph,
        node: NodeId,
        data: MonikerData,
    ) -> Result<ElementId> {
        let target = self.node(node)?;
        let kind = data.kind;
        let clashing = match kind {
            MonikerKind::Export => Some(MonikerKind::Local),
            MonikerKind::Local => Some(MonikerKind::Export),
            MonikerKind::Import => None,
        };
        if target.moniker(kind).is_some() {
            return Err(IndexError::invariant(format!(
                "{} already carries a {:?} moniker",
                node, kind
            )));
        }
        if let Some(clash) = clashing.filter(|clash| target.moniker(*clash).is_some()) {
            return Err(IndexError::invariant(format!(
                "{} cannot carry both {:?} and {:?} monikers",
                node, clash, kind
            )));
        }

        let node_vertex = target.vertex;
        let moniker_vertex = graph.add_vertex(ids, Vertex::Moniker(data));
        graph.add_edge(
            ids,
            Edge::Moniker {
                out_v: node_vertex,
                in_v: moniker_vertex,
            },
        );
        self.nodes[node.0 as usize]
            .monikers
            .push((kind, moniker_vertex));
        Ok(moniker_vertex)
    }

    /// Record that `decl` resolved to `node`.
    pub fn bind_declaration(&mut self, decl: DeclRef, node: NodeId) {
        self.by_declaration.insert(decl, node);
        self.last_declaration.insert(decl.symbol, node);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&IdentityNode> {
        self.nodes.get(id.0 as usize)
    }

    fn node(&self, id: NodeId) -> Result<&IdentityNode> {
        self.get(id)
            .ok_or_else(|| IndexError::invariant(format!("unknown {}", id)))
    }

    /// Follow `next` links to the end of the chain.
    pub fn terminal(&self, id: NodeId) -> NodeId {
        let mut current = id;
        // `link` keeps chains acyclic; no chain is longer than the table.
        for _ in 0..=self.nodes.len() {
            match self.get(current).and_then(|node| node.next) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Canonical node of a symbol.
    pub fn canonical(&self, key: SymbolKey) -> Option<NodeId> {
        self.by_symbol.get(&key).copied()
    }

    /// Node a declaration resolved to.
    pub fn declaration_node(&self, decl: DeclRef) -> Option<NodeId> {
        self.by_declaration.get(&decl).copied()
    }

    /// Node of the most recently resolved declaration of a symbol.
    pub fn last_declaration(&self, key: SymbolKey) -> Option<NodeId> {
        self.last_declaration.get(&key).copied()
    }

    /// Root node of a module document.
    pub fn module_node(&self, doc: DocumentId) -> Option<NodeId> {
        self.by_module.get(&doc).copied()
    }

    /// Export face of `key` under `identifier`.
    pub fn export_node(&self, key: SymbolKey, identifier: &str) -> Option<NodeId> {
        self.by_export.get(&(key, identifier.to_string())).copied()
    }

    /// All nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityNode> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
