//! The indexing pass.
//!
//! [`index_program`] walks a resolved program once and emits the identity
//! part of the graph. Emission order, which fixes every element id:
//!
//! 1. `metaData` and `project` vertices.
//! 2. Project documents in lexical path order. For each document:
//!    - the `document` vertex
//!    - the module root node, for module documents
//!    - declarations in source order, members depth first: identity node
//!      (on first sight), definition range, `next` edge from the range
//!    - export statements in source order: outer nodes for the indirected
//!      targets and their exported members
//!    - reference sites in range order: range, `next` edge to the canonical
//!      node
//!    - `item` edges for the document, then `contains` document → ranges
//! 3. Dependency documents in lexical path order: identity nodes and import
//!    monikers only, no document or range vertices.
//! 4. `contains` project → documents.
//!
//! The pass is single-threaded and owns its [`IdCounter`]; two runs over the
//! same program produce identical graphs.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::exports::ExportPlan;
use crate::graph::{Edge, ElementId, Graph, IdCounter, RangeTag, Vertex};
use crate::model::{DeclRef, Document, DocumentId, ReferenceKind, SemanticModel, SymbolKey};
use crate::moniker::{LocalHasher, MonikerAssigner};
use crate::nodes::{IdentityNode, NodeTable};
use crate::options::{to_uri, IndexOptions};
use crate::references::{Occurrence, ReferenceAggregate, ReferenceAggregator};
use crate::types::Range;

/// LSIF format version written on the metadata vertex.
pub const LSIF_VERSION: &str = "0.4.3";

/// Position encoding written on the metadata vertex.
pub const POSITION_ENCODING: &str = "utf-16";

// ============================================================================
// Output
// ============================================================================

/// Counters collected during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Project documents emitted.
    pub documents: usize,
    /// Dependency documents walked.
    pub external_documents: usize,
    pub identity_nodes: usize,
    pub monikers: usize,
    pub ranges: usize,
    pub aggregates: usize,
    /// Outer nodes created for export statements.
    pub indirections: usize,
    /// Inputs the model could not resolve.
    pub skipped: usize,
    /// Members that lost their export path to an earlier merged sibling.
    pub demoted_members: usize,
}

/// Everything a pass produces.
#[derive(Debug)]
pub struct IndexOutput {
    pub graph: Graph,
    pub aggregates: Vec<ReferenceAggregate>,
    pub nodes: NodeTable,
    pub stats: IndexStats,
}

impl IndexOutput {
    /// The identity node carrying the moniker with `identifier`.
    pub fn node_with_moniker(&self, identifier: &str) -> Option<&IdentityNode> {
        let (vertex, _) = self.graph.moniker_by_identifier(identifier)?;
        self.nodes
            .iter()
            .find(|node| node.monikers().iter().any(|(_, id)| *id == vertex))
    }

    /// Identifiers of every moniker, in emission order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.graph
            .monikers()
            .map(|(_, data)| data.identifier.as_str())
            .collect()
    }
}

/// Run one pass over `model`.
pub fn index_program<M: SemanticModel>(model: &M, options: &IndexOptions) -> Result<IndexOutput> {
    Indexer::new(model, options)?.run()
}

// ============================================================================
// Indexer
// ============================================================================

/// Ranges collected while walking one project document.
#[derive(Debug)]
struct DocumentWalk {
    document: DocumentId,
    vertex: ElementId,
    ranges: Vec<ElementId>,
}

/// A reference site waiting for its document's walk.
#[derive(Debug, Clone, Copy)]
struct PendingReference {
    range: Range,
    symbol: SymbolKey,
    kind: ReferenceKind,
}

/// State of one pass.
pub struct Indexer<'a, M: SemanticModel> {
    pub(crate) model: &'a M,
    pub(crate) options: &'a IndexOptions,
    pub(crate) ids: IdCounter,
    pub(crate) graph: Graph,
    pub(crate) nodes: NodeTable,
    pub(crate) assigner: MonikerAssigner,
    pub(crate) aggregator: ReferenceAggregator,
    pub(crate) plan: ExportPlan,
    pub(crate) stats: IndexStats,
    /// Symbols with at least one reference site in a project document.
    pub(crate) referenced: HashSet<SymbolKey>,
    visited: HashSet<DeclRef>,
    order: Vec<&'a Document>,
}

impl<M: SemanticModel> fmt::Debug for Indexer<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexer")
            .field("options", self.options)
            .field("emitted", &self.ids.issued())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<'a, M: SemanticModel> Indexer<'a, M> {
    /// Prepare a pass: validate options, fix document order, plan exports.
    pub fn new(model: &'a M, options: &'a IndexOptions) -> Result<Self> {
        options.validate()?;

        let mut project: Vec<&'a Document> = Vec::new();
        let mut external: Vec<&'a Document> = Vec::new();
        for document in model.documents() {
            if document.external {
                external.push(document);
            } else {
                project.push(document);
            }
        }
        project.sort_by(|a, b| a.path.cmp(&b.path));
        external.sort_by(|a, b| a.path.cmp(&b.path));
        let order: Vec<&'a Document> = project.into_iter().chain(external).collect();

        let plan = ExportPlan::build(model, options, &order);
        let stats = IndexStats {
            demoted_members: plan.demoted(),
            ..IndexStats::default()
        };

        Ok(Indexer {
            model,
            options,
            ids: IdCounter::new(),
            graph: Graph::new(),
            nodes: NodeTable::new(),
            assigner: MonikerAssigner::new(options.scheme.clone()),
            aggregator: ReferenceAggregator::new(),
            plan,
            stats,
            referenced: HashSet::new(),
            visited: HashSet::new(),
            order,
        })
    }

    /// Replace the hasher used for local monikers.
    pub fn with_local_hasher(mut self, hasher: LocalHasher) -> Self {
        self.assigner = self.assigner.with_hasher(hasher);
        self
    }

    /// Run the pass.
    pub fn run(mut self) -> Result<IndexOutput> {
        self.graph.add_vertex(
            &mut self.ids,
            Vertex::MetaData {
                version: LSIF_VERSION.to_string(),
                project_root: self.options.root_uri(),
                position_encoding: POSITION_ENCODING.to_string(),
            },
        );
        let project = self.graph.add_vertex(
            &mut self.ids,
            Vertex::Project {
                kind: self.options.project_kind.clone(),
            },
        );

        let mut references = self.collect_references();
        let order = std::mem::take(&mut self.order);
        let mut documents = Vec::new();
        for document in order.iter().copied() {
            if document.external {
                self.index_external(document)?;
            } else {
                let pending = references.remove(&document.id).unwrap_or_default();
                documents.push(self.index_document(document, pending)?);
            }
        }

        if self.options.emit_contains && !documents.is_empty() {
            self.graph.add_edge(
                &mut self.ids,
                Edge::Contains {
                    out_v: project,
                    in_vs: documents,
                },
            );
        }

        self.stats.identity_nodes = self.nodes.len();
        self.stats.aggregates = self.aggregator.len();
        self.stats.demoted_members += self.assigner.demoted();
        info!(
            documents = self.stats.documents,
            external_documents = self.stats.external_documents,
            identity_nodes = self.stats.identity_nodes,
            monikers = self.stats.monikers,
            aggregates = self.stats.aggregates,
            skipped = self.stats.skipped,
            demoted_members = self.stats.demoted_members,
            elements = self.ids.issued(),
            "index pass complete"
        );

        Ok(IndexOutput {
            graph: self.graph,
            aggregates: self.aggregator.finalize(),
            nodes: self.nodes,
            stats: self.stats,
        })
    }

    /// Group reference sites by project document, sorted by range.
    ///
    /// Runs before any node is allocated: it fixes the set of symbols that
    /// get a reference result.
    fn collect_references(&mut self) -> BTreeMap<DocumentId, Vec<PendingReference>> {
        let model = self.model;
        let mut by_document: BTreeMap<DocumentId, Vec<PendingReference>> = BTreeMap::new();
        for symbol in model.symbols() {
            for site in &symbol.references {
                match model.document(site.document) {
                    Some(document) if !document.external => {
                        self.referenced.insert(symbol.key);
                        by_document
                            .entry(site.document)
                            .or_default()
                            .push(PendingReference {
                                range: site.range,
                                symbol: symbol.key,
                                kind: site.kind,
                            });
                    }
                    Some(_) => {}
                    None => self.skip(format_args!(
                        "reference to {} in unknown {}",
                        symbol.key, site.document
                    )),
                }
            }
        }
        for pending in by_document.values_mut() {
            pending.sort_by_key(|reference| (reference.range, reference.symbol));
        }
        by_document
    }

    fn index_document(
        &mut self,
        document: &'a Document,
        references: Vec<PendingReference>,
    ) -> Result<ElementId> {
        let vertex = self.graph.add_vertex(
            &mut self.ids,
            Vertex::Document {
                uri: to_uri(&document.path),
                language_id: document.language_id.clone(),
            },
        );
        let mut walk = DocumentWalk {
            document: document.id,
            vertex,
            ranges: Vec::new(),
        };

        if document.module {
            self.resolve_module(document)?;
        }
        for decl in &document.declarations {
            self.visit_declaration(*decl, Some(&mut walk))?;
        }
        if document.module {
            for export in &document.exports {
                self.indirect_export(document, export)?;
            }
        }
        for reference in references {
            self.visit_reference(reference, &mut walk)?;
        }

        self.aggregator
            .flush_shard(&mut self.ids, &mut self.graph, vertex);
        if self.options.emit_contains && !walk.ranges.is_empty() {
            self.graph.add_edge(
                &mut self.ids,
                Edge::Contains {
                    out_v: vertex,
                    in_vs: walk.ranges,
                },
            );
        }
        self.stats.documents += 1;
        debug!(path = %document.path, "indexed document");
        Ok(vertex)
    }

    fn index_external(&mut self, document: &'a Document) -> Result<()> {
        if document.module {
            self.resolve_module(document)?;
        }
        for decl in &document.declarations {
            self.visit_declaration(*decl, None)?;
        }
        if document.module {
            for export in &document.exports {
                self.indirect_export(document, export)?;
            }
        }
        self.stats.external_documents += 1;
        debug!(path = %document.path, "indexed dependency document");
        Ok(())
    }

    /// Resolve a declaration and its members, emitting definition ranges for
    /// those that sit in the walked document.
    fn visit_declaration(
        &mut self,
        decl: DeclRef,
        mut walk: Option<&mut DocumentWalk>,
    ) -> Result<()> {
        if !self.visited.insert(decl) {
            return Ok(());
        }
        let model = self.model;
        let (Some(symbol), Some(declaration)) =
            (model.symbol(decl.symbol), model.declaration(decl))
        else {
            self.skip(format_args!("unknown declaration {}", decl));
            return Ok(());
        };
        let Some(node) = self.resolve_declaration(decl)? else {
            return Ok(());
        };

        if let Some(current) = walk
            .as_deref_mut()
            .filter(|current| current.document == declaration.document)
        {
            let range = self.graph.add_vertex(
                &mut self.ids,
                Vertex::Range {
                    start: declaration.range.start,
                    end: declaration.range.end,
                    tag: RangeTag::Definition {
                        text: symbol.name.clone(),
                        kind: symbol.kind.lsp_kind(),
                        full_range: declaration.full_range,
                    },
                },
            );
            let node_vertex = self.node_vertex(node)?;
            self.graph.add_edge(
                &mut self.ids,
                Edge::Next {
                    out_v: range,
                    in_v: node_vertex,
                },
            );
            self.aggregator.record(
                &self.nodes,
                node,
                Occurrence::definition(range, current.vertex),
            );
            current.ranges.push(range);
            self.stats.ranges += 1;
        }

        for member in &declaration.members {
            self.visit_declaration(*member, walk.as_deref_mut())?;
        }
        Ok(())
    }

    fn visit_reference(
        &mut self,
        reference: PendingReference,
        walk: &mut DocumentWalk,
    ) -> Result<()> {
        let model = self.model;
        let Some(symbol) = model.symbol(reference.symbol) else {
            self.skip(format_args!("reference to unknown {}", reference.symbol));
            return Ok(());
        };
        let Some(node) = self.resolve(symbol.key)? else {
            return Ok(());
        };

        let tag = match reference.kind {
            ReferenceKind::Import => RangeTag::Definition {
                text: symbol.name.clone(),
                kind: symbol.kind.lsp_kind(),
                full_range: reference.range,
            },
            ReferenceKind::Reference => RangeTag::Reference {
                text: symbol.name.clone(),
            },
        };
        let range = self.graph.add_vertex(
            &mut self.ids,
            Vertex::Range {
                start: reference.range.start,
                end: reference.range.end,
                tag,
            },
        );
        let node_vertex = self.node_vertex(node)?;
        self.graph.add_edge(
            &mut self.ids,
            Edge::Next {
                out_v: range,
                in_v: node_vertex,
            },
        );
        self.aggregator
            .record(&self.nodes, node, Occurrence::reference(range, walk.vertex));
        walk.ranges.push(range);
        self.stats.ranges += 1;
        Ok(())
    }

    /// Count and log input the model cannot resolve.
    pub(crate) fn skip(&mut self, what: impl fmt::Display) {
        self.stats.skipped += 1;
        debug!(reason = %what, "skipping unresolvable input");
    }
}
