//! Graph elements produced by an indexing pass.
//!
//! Every element carries a numeric id assigned from an explicit [`IdCounter`]
//! in emission order, starting at 1. Elements serialize to LSIF-shaped JSON
//! objects:
//!
//! ```
//! use tugindex_core::graph::{Element, ElementId, MonikerData, MonikerKind, UniquenessLevel, Vertex};
//!
//! let element = Element::vertex(
//!     ElementId::new(16),
//!     Vertex::Moniker(MonikerData {
//!         scheme: "tsc".to_string(),
//!         identifier: "a:x".to_string(),
//!         unique: UniquenessLevel::Group,
//!         kind: MonikerKind::Export,
//!     }),
//! );
//! let json = serde_json::to_string(&element).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"id":16,"type":"vertex","label":"moniker","scheme":"tsc","identifier":"a:x","unique":"group","kind":"export"}"#
//! );
//! ```
//!
//! The graph is write-once: elements are appended during the pass and never
//! mutated or removed.

use std::fmt;

use serde::Serialize;

use crate::types::{Position, Range};

// ============================================================================
// Ids
// ============================================================================

/// Id of an emitted vertex or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Create a new element ID.
    pub fn new(id: u64) -> Self {
        ElementId(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source shared by every emission in one pass.
///
/// Owned by the pass and handed to each emission call; there is no global
/// counter, so independent passes never interfere.
#[derive(Debug)]
pub struct IdCounter {
    next: u64,
}

impl Default for IdCounter {
    fn default() -> Self {
        IdCounter { next: 1 }
    }
}

impl IdCounter {
    /// Create a counter whose first id is 1.
    pub fn new() -> Self {
        IdCounter::default()
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId::new(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

// ============================================================================
// Moniker Payload
// ============================================================================

/// Uniqueness scope of a moniker identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniquenessLevel {
    /// Unique within one document.
    Document,
    /// Unique within the project group.
    Group,
}

/// Kind of moniker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonikerKind {
    /// Symbol exported by this project.
    Export,
    /// Document-local symbol.
    Local,
    /// Symbol imported from a dependency.
    Import,
}

/// Moniker vertex payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MonikerData {
    pub scheme: String,
    pub identifier: String,
    pub unique: UniquenessLevel,
    pub kind: MonikerKind,
}

// ============================================================================
// Range Payload
// ============================================================================

/// Tag carried by a range vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RangeTag {
    /// The range declares a name.
    Definition {
        text: String,
        kind: u32,
        #[serde(rename = "fullRange")]
        full_range: Range,
    },
    /// The range uses a name.
    Reference { text: String },
}

/// Which half of a reference result an `item` edge fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemProperty {
    Definitions,
    References,
}

// ============================================================================
// Vertices and Edges
// ============================================================================

/// Vertex payloads, tagged by `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "label", rename_all = "camelCase")]
pub enum Vertex {
    MetaData {
        version: String,
        #[serde(rename = "projectRoot")]
        project_root: String,
        #[serde(rename = "positionEncoding")]
        position_encoding: String,
    },
    Project {
        kind: String,
    },
    Document {
        uri: String,
        #[serde(rename = "languageId")]
        language_id: String,
    },
    /// An identity node.
    ResultSet {},
    Moniker(MonikerData),
    Range {
        start: Position,
        end: Position,
        tag: RangeTag,
    },
    ReferenceResult {},
}

/// Edge payloads, tagged by `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "label")]
pub enum Edge {
    /// Chains a node (or range) toward the node that carries its identity.
    #[serde(rename = "next")]
    Next {
        #[serde(rename = "outV")]
        out_v: ElementId,
        #[serde(rename = "inV")]
        in_v: ElementId,
    },
    #[serde(rename = "moniker")]
    Moniker {
        #[serde(rename = "outV")]
        out_v: ElementId,
        #[serde(rename = "inV")]
        in_v: ElementId,
    },
    #[serde(rename = "textDocument/references")]
    References {
        #[serde(rename = "outV")]
        out_v: ElementId,
        #[serde(rename = "inV")]
        in_v: ElementId,
    },
    #[serde(rename = "contains")]
    Contains {
        #[serde(rename = "outV")]
        out_v: ElementId,
        #[serde(rename = "inVs")]
        in_vs: Vec<ElementId>,
    },
    #[serde(rename = "item")]
    Item {
        #[serde(rename = "outV")]
        out_v: ElementId,
        #[serde(rename = "inVs")]
        in_vs: Vec<ElementId>,
        shard: ElementId,
        property: ItemProperty,
    },
}

/// Vertex or edge, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementData {
    Vertex(Vertex),
    Edge(Edge),
}

/// One emitted graph element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(flatten)]
    pub data: ElementData,
}

impl Element {
    /// Create a vertex element.
    pub fn vertex(id: ElementId, vertex: Vertex) -> Self {
        Element {
            id,
            data: ElementData::Vertex(vertex),
        }
    }

    /// Create an edge element.
    pub fn edge(id: ElementId, edge: Edge) -> Self {
        Element {
            id,
            data: ElementData::Edge(edge),
        }
    }

    /// The vertex payload, if this is a vertex.
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match &self.data {
            ElementData::Vertex(vertex) => Some(vertex),
            ElementData::Edge(_) => None,
        }
    }

    /// The edge payload, if this is an edge.
    pub fn as_edge(&self) -> Option<&Edge> {
        match &self.data {
            ElementData::Edge(edge) => Some(edge),
            ElementData::Vertex(_) => None,
        }
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Append-only element list.
///
/// Ids are dense: the element with id `n` sits at index `n - 1`.
#[derive(Debug, Default)]
pub struct Graph {
    elements: Vec<Element>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Graph::default()
    }

    /// Emit a vertex and return its id.
    pub fn add_vertex(&mut self, ids: &mut IdCounter, vertex: Vertex) -> ElementId {
        let id = ids.next_id();
        self.elements.push(Element::vertex(id, vertex));
        id
    }

    /// Emit an edge and return its id.
    pub fn add_edge(&mut self, ids: &mut IdCounter, edge: Edge) -> ElementId {
        let id = ids.next_id();
        self.elements.push(Element::edge(id, edge));
        id
    }

    /// Look up an element by id.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.elements.get(index).filter(|element| element.id == id)
    }

    /// All elements in emission order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Moniker vertices in emission order.
    pub fn monikers(&self) -> impl Iterator<Item = (ElementId, &MonikerData)> {
        self.elements.iter().filter_map(|element| match element.as_vertex() {
            Some(Vertex::Moniker(data)) => Some((element.id, data)),
            _ => None,
        })
    }

    /// Find the moniker vertex with the given identifier.
    pub fn moniker_by_identifier(&self, identifier: &str) -> Option<(ElementId, &MonikerData)> {
        self.monikers().find(|(_, data)| data.identifier == identifier)
    }

    /// Edges in emission order.
    pub fn edges(&self) -> impl Iterator<Item = (ElementId, &Edge)> {
        self.elements
            .iter()
            .filter_map(|element| element.as_edge().map(|edge| (element.id, edge)))
    }

    /// Serialize every element as one JSON object per line.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for element in &self.elements {
            out.push_str(&serde_json::to_string(element)?);
            out.push('\n');
        }
        Ok(out)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod counter_tests {
        use super::*;

        #[test]
        fn ids_start_at_one_and_increase() {
            let mut ids = IdCounter::new();
            assert_eq!(ids.next_id(), ElementId::new(1));
            assert_eq!(ids.next_id(), ElementId::new(2));
            assert_eq!(ids.issued(), 2);
        }

        #[test]
        fn graph_lookup_matches_emission_order() {
            let mut ids = IdCounter::new();
            let mut graph = Graph::new();
            let a = graph.add_vertex(&mut ids, Vertex::ResultSet {});
            let b = graph.add_vertex(&mut ids, Vertex::ResultSet {});
            let e = graph.add_edge(&mut ids, Edge::Next { out_v: b, in_v: a });

            assert_eq!(graph.len(), 3);
            assert_eq!(graph.get(e).unwrap().id, e);
            assert!(graph.get(ElementId::new(0)).is_none());
            assert!(graph.get(ElementId::new(4)).is_none());
        }
    }

    mod serialization_tests {
        use super::*;

        #[test]
        fn result_set_has_only_id_type_label() {
            let element = Element::vertex(ElementId::new(15), Vertex::ResultSet {});
            assert_eq!(
                serde_json::to_value(&element).unwrap(),
                json!({"id": 15, "type": "vertex", "label": "resultSet"})
            );
        }

        #[test]
        fn next_edge_shape() {
            let element = Element::edge(
                ElementId::new(23),
                Edge::Next {
                    out_v: ElementId::new(22),
                    in_v: ElementId::new(15),
                },
            );
            assert_eq!(
                serde_json::to_value(&element).unwrap(),
                json!({"id": 23, "type": "edge", "label": "next", "outV": 22, "inV": 15})
            );
        }

        #[test]
        fn local_moniker_shape() {
            let element = Element::vertex(
                ElementId::new(16),
                Vertex::Moniker(MonikerData {
                    scheme: "tsc".to_string(),
                    identifier: "0f3c".to_string(),
                    unique: UniquenessLevel::Document,
                    kind: MonikerKind::Local,
                }),
            );
            assert_eq!(
                serde_json::to_value(&element).unwrap(),
                json!({
                    "id": 16, "type": "vertex", "label": "moniker",
                    "scheme": "tsc", "identifier": "0f3c",
                    "unique": "document", "kind": "local"
                })
            );
        }

        #[test]
        fn definition_range_shape() {
            let range = Range::on_line(0, 9, 12);
            let element = Element::vertex(
                ElementId::new(60),
                Vertex::Range {
                    start: range.start,
                    end: range.end,
                    tag: RangeTag::Definition {
                        text: "foo".to_string(),
                        kind: 12,
                        full_range: range,
                    },
                },
            );
            assert_eq!(
                serde_json::to_value(&element).unwrap(),
                json!({
                    "id": 60, "type": "vertex", "label": "range",
                    "start": {"line": 0, "character": 9},
                    "end": {"line": 0, "character": 12},
                    "tag": {
                        "type": "definition", "text": "foo", "kind": 12,
                        "fullRange": {
                            "start": {"line": 0, "character": 9},
                            "end": {"line": 0, "character": 12}
                        }
                    }
                })
            );
        }

        #[test]
        fn reference_range_tag_shape() {
            let tag = RangeTag::Reference {
                text: "foo".to_string(),
            };
            assert_eq!(
                serde_json::to_value(&tag).unwrap(),
                json!({"type": "reference", "text": "foo"})
            );
        }

        #[test]
        fn item_edge_shape() {
            let element = Element::edge(
                ElementId::new(74),
                Edge::Item {
                    out_v: ElementId::new(39),
                    in_vs: vec![ElementId::new(60), ElementId::new(66)],
                    shard: ElementId::new(49),
                    property: ItemProperty::References,
                },
            );
            assert_eq!(
                serde_json::to_value(&element).unwrap(),
                json!({
                    "id": 74, "type": "edge", "label": "item",
                    "outV": 39, "inVs": [60, 66], "shard": 49,
                    "property": "references"
                })
            );
        }

        #[test]
        fn references_edge_label() {
            let element = Element::edge(
                ElementId::new(40),
                Edge::References {
                    out_v: ElementId::new(15),
                    in_v: ElementId::new(39),
                },
            );
            assert_eq!(
                serde_json::to_value(&element).unwrap()["label"],
                json!("textDocument/references")
            );
        }

        #[test]
        fn json_lines_has_one_line_per_element() {
            let mut ids = IdCounter::new();
            let mut graph = Graph::new();
            graph.add_vertex(
                &mut ids,
                Vertex::Project {
                    kind: "typescript".to_string(),
                },
            );
            graph.add_vertex(&mut ids, Vertex::ResultSet {});
            let lines = graph.to_json_lines().unwrap();
            assert_eq!(lines.lines().count(), 2);
            assert!(lines.starts_with(r#"{"id":1,"type":"vertex","label":"project","kind":"typescript"}"#));
        }
    }
}
