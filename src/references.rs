//! Reference aggregation.
//!
//! Every definition and usage of a referenced symbol ends up in one
//! [`ReferenceAggregate`], keyed by the terminal node of its identity chain.
//! Occurrences are grouped per shard (the containing document). When the
//! driver finishes a document it calls [`ReferenceAggregator::flush_shard`],
//! which emits the `item` edges for that document.

use std::collections::{HashMap, HashSet};

use crate::graph::{Edge, ElementId, Graph, IdCounter, ItemProperty, Vertex};
use crate::nodes::{NodeId, NodeTable};

/// One occurrence of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// The range vertex.
    pub range: ElementId,
    /// The document vertex containing the range.
    pub shard: ElementId,
    pub property: ItemProperty,
}

impl Occurrence {
    pub fn definition(range: ElementId, shard: ElementId) -> Self {
        Occurrence {
            range,
            shard,
            property: ItemProperty::Definitions,
        }
    }

    pub fn reference(range: ElementId, shard: ElementId) -> Self {
        Occurrence {
            range,
            shard,
            property: ItemProperty::References,
        }
    }
}

/// Occurrences of one identity within one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardOccurrences {
    pub shard: ElementId,
    pub definitions: Vec<ElementId>,
    pub references: Vec<ElementId>,
}

impl ShardOccurrences {
    fn new(shard: ElementId) -> Self {
        ShardOccurrences {
            shard,
            definitions: Vec::new(),
            references: Vec::new(),
        }
    }

    fn ranges(&self, property: ItemProperty) -> &[ElementId] {
        match property {
            ItemProperty::Definitions => &self.definitions,
            ItemProperty::References => &self.references,
        }
    }
}

/// All occurrences of one canonical identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAggregate {
    pub node: NodeId,
    /// The `referenceResult` vertex.
    pub result: ElementId,
    /// Per-document occurrences, in shard emission order.
    pub shards: Vec<ShardOccurrences>,
}

impl ReferenceAggregate {
    /// Total number of occurrences across shards.
    pub fn occurrence_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.definitions.len() + shard.references.len())
            .sum()
    }

    /// Occurrences recorded for `shard`.
    pub fn shard(&self, shard: ElementId) -> Option<&ShardOccurrences> {
        self.shards.iter().find(|entry| entry.shard == shard)
    }
}

/// Collects occurrences and emits reference results.
#[derive(Debug, Default)]
pub struct ReferenceAggregator {
    aggregates: Vec<ReferenceAggregate>,
    by_node: HashMap<NodeId, usize>,
    /// Aggregates touched since the last flush, first-seen order.
    pending: Vec<usize>,
    pending_set: HashSet<usize>,
}

impl ReferenceAggregator {
    pub fn new() -> Self {
        ReferenceAggregator::default()
    }

    /// Give `node` a reference result, emitting the `referenceResult` vertex
    /// and the `textDocument/references` edge. Idempotent.
    pub fn open(
        &mut self,
        ids: &mut IdCounter,
        graph: &mut Graph,
        node: NodeId,
        node_vertex: ElementId,
    ) -> ElementId {
        if let Some(index) = self.by_node.get(&node) {
            return self.aggregates[*index].result;
        }
        let result = graph.add_vertex(ids, Vertex::ReferenceResult {});
        graph.add_edge(
            ids,
            Edge::References {
                out_v: node_vertex,
                in_v: result,
            },
        );
        self.by_node.insert(node, self.aggregates.len());
        self.aggregates.push(ReferenceAggregate {
            node,
            result,
            shards: Vec::new(),
        });
        result
    }

    /// Record an occurrence against the terminal node of `node`'s chain.
    ///
    /// Returns `false` when that node has no reference result.
    pub fn record(&mut self, nodes: &NodeTable, node: NodeId, occurrence: Occurrence) -> bool {
        let terminal = nodes.terminal(node);
        let Some(&index) = self.by_node.get(&terminal) else {
            return false;
        };

        let aggregate = &mut self.aggregates[index];
        let position = match aggregate
            .shards
            .iter()
            .position(|entry| entry.shard == occurrence.shard)
        {
            Some(position) => position,
            None => {
                aggregate.shards.push(ShardOccurrences::new(occurrence.shard));
                aggregate.shards.len() - 1
            }
        };
        let entry = &mut aggregate.shards[position];
        match occurrence.property {
            ItemProperty::Definitions => entry.definitions.push(occurrence.range),
            ItemProperty::References => entry.references.push(occurrence.range),
        }

        if self.pending_set.insert(index) {
            self.pending.push(index);
        }
        true
    }

    /// Emit `item` edges for everything recorded in `shard`.
    ///
    /// One edge per (aggregate, property), aggregates in the order they were
    /// first touched, definitions before references. Returns the edge count.
    pub fn flush_shard(&mut self, ids: &mut IdCounter, graph: &mut Graph, shard: ElementId) -> usize {
        let mut emitted = 0;
        for index in self.pending.drain(..) {
            let aggregate = &self.aggregates[index];
            let Some(entry) = aggregate.shard(shard) else {
                continue;
            };
            for property in [ItemProperty::Definitions, ItemProperty::References] {
                let ranges = entry.ranges(property);
                if ranges.is_empty() {
                    continue;
                }
                graph.add_edge(
                    ids,
                    Edge::Item {
                        out_v: aggregate.result,
                        in_vs: ranges.to_vec(),
                        shard,
                        property,
                    },
                );
                emitted += 1;
            }
        }
        self.pending_set.clear();
        emitted
    }

    /// Aggregate for a node, if one was opened.
    pub fn aggregate(&self, node: NodeId) -> Option<&ReferenceAggregate> {
        self.by_node.get(&node).map(|index| &self.aggregates[*index])
    }

    /// Number of aggregates.
    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// All aggregates in the order they were opened.
    pub fn finalize(self) -> Vec<ReferenceAggregate> {
        self.aggregates
    }
}

// ============================================================================
// Tests
// ============================================================================
