//! Integration tests for reference aggregation across documents.

use tugindex::graph::{Edge, ElementId, ItemProperty, MonikerKind, Vertex};
use tugindex::model::{
    Declaration, Document, DocumentId, ExportStatement, ProgramBuilder, ReferenceSite, SymbolKind,
};
use tugindex::types::Range;
use tugindex::{index_program, IndexOptions, IndexOutput};

fn run(builder: ProgramBuilder) -> IndexOutput {
    let program = builder.build().unwrap();
    index_program(&program, &IndexOptions::new("/@test")).unwrap()
}

/// Document vertices in emission order.
fn document_vertices(output: &IndexOutput) -> Vec<ElementId> {
    output
        .graph
        .elements()
        .iter()
        .filter(|element| matches!(element.as_vertex(), Some(Vertex::Document { .. })))
        .map(|element| element.id)
        .collect()
}

fn items(output: &IndexOutput) -> Vec<(ElementId, Vec<ElementId>, ElementId, ItemProperty)> {
    output
        .graph
        .edges()
        .filter_map(|(_, edge)| match edge {
            Edge::Item {
                out_v,
                in_vs,
                shard,
                property,
            } => Some((*out_v, in_vs.clone(), *shard, *property)),
            _ => None,
        })
        .collect()
}

/// The node vertex a range's `next` edge points at.
fn range_target(output: &IndexOutput, range: ElementId) -> Option<ElementId> {
    output.graph.edges().find_map(|(_, edge)| match edge {
        Edge::Next { out_v, in_v } if *out_v == range => Some(*in_v),
        _ => None,
    })
}

mod unification_tests {
    use super::*;

    #[test]
    fn one_aggregate_spans_documents() {
        // a.ts: export function foo() {}   b.ts, c.ts: foo();
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let bdoc = b.add_document(Document::new("/@test/b.ts").as_module());
        let cdoc = b.add_document(Document::new("/@test/c.ts").as_module());
        let foo = b.add_symbol(SymbolKind::Function, "foo");
        b.export_symbol(foo);
        b.declare(foo, Declaration::new(a, Range::on_line(0, 16, 19)));
        b.add_reference(foo, ReferenceSite::new(cdoc, Range::on_line(1, 0, 3)));
        b.add_reference(foo, ReferenceSite::new(bdoc, Range::on_line(1, 0, 3)));
        b.add_reference(foo, ReferenceSite::new(bdoc, Range::on_line(2, 0, 3)));
        let output = run(b);

        assert_eq!(output.aggregates.len(), 1);
        let aggregate = &output.aggregates[0];
        assert_eq!(aggregate.node, output.nodes.canonical(foo).unwrap());

        let docs = document_vertices(&output);
        let shards: Vec<ElementId> = aggregate.shards.iter().map(|s| s.shard).collect();
        assert_eq!(shards, docs);
        assert_eq!(aggregate.shards[0].definitions.len(), 1);
        assert!(aggregate.shards[0].references.is_empty());
        assert_eq!(aggregate.shards[1].references.len(), 2);
        assert_eq!(aggregate.shards[2].references.len(), 1);
        assert_eq!(aggregate.occurrence_count(), 4);

        // Only one reference result exists for the symbol.
        let results = output
            .graph
            .elements()
            .iter()
            .filter(|element| matches!(element.as_vertex(), Some(Vertex::ReferenceResult {})))
            .count();
        assert_eq!(results, 1);
        assert_eq!(items(&output).len(), 3);
    }

    #[test]
    fn merged_declarations_share_one_aggregate() {
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let ral = b.add_symbol(SymbolKind::Interface, "RAL");
        b.export_symbol(ral);
        b.declare(ral, Declaration::new(a, Range::on_line(0, 17, 20)));
        b.declare(ral, Declaration::new(a, Range::on_line(1, 17, 20)));
        b.add_reference(ral, ReferenceSite::new(a, Range::on_line(2, 9, 12)));
        let output = run(b);

        assert_eq!(output.aggregates.len(), 1);
        let shard = &output.aggregates[0].shards[0];
        assert_eq!(shard.definitions.len(), 2);
        assert_eq!(shard.references.len(), 1);

        // The second definition range points at its own declaration node.
        let canonical_vertex = output
            .nodes
            .get(output.nodes.canonical(ral).unwrap())
            .unwrap()
            .vertex;
        assert_eq!(range_target(&output, shard.definitions[0]), Some(canonical_vertex));
        assert_ne!(range_target(&output, shard.definitions[1]), Some(canonical_vertex));
        assert_eq!(range_target(&output, shard.references[0]), Some(canonical_vertex));
    }

    #[test]
    fn references_to_indirected_symbol_land_on_canonical_node() {
        // a.ts: function foo() {}  export default foo;   b.ts: foo();
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let bdoc = b.add_document(Document::new("/@test/b.ts").as_module());
        let foo = b.add_symbol(SymbolKind::Function, "foo");
        b.declare(foo, Declaration::new(a, Range::on_line(0, 9, 12)));
        b.add_export(a, ExportStatement::default_export(foo));
        b.add_reference(foo, ReferenceSite::new(bdoc, Range::on_line(1, 0, 3)));
        let output = run(b);

        let canonical = output.nodes.canonical(foo).unwrap();
        let outer = output.node_with_moniker("a:foo").unwrap();
        assert_eq!(output.aggregates.len(), 1);
        assert_eq!(output.aggregates[0].node, canonical);
        assert_ne!(outer.id, canonical);

        let reference = output.aggregates[0].shards[1].references[0];
        assert_eq!(
            range_target(&output, reference),
            Some(output.nodes.get(canonical).unwrap().vertex)
        );
    }
}

mod occurrence_tests {
    use super::*;

    #[test]
    fn referenced_internal_symbol_gets_local_moniker() {
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let helper = b.add_symbol(SymbolKind::Function, "helper");
        b.declare(helper, Declaration::new(a, Range::on_line(0, 9, 15)));
        b.add_reference(helper, ReferenceSite::new(a, Range::on_line(3, 2, 8)));
        let output = run(b);

        let node = output.nodes.get(output.nodes.canonical(helper).unwrap()).unwrap();
        assert!(node.moniker(MonikerKind::Local).is_some());
        assert!(node.moniker(MonikerKind::Export).is_none());
        assert_eq!(output.aggregates.len(), 1);
    }

    #[test]
    fn import_binding_is_a_definition_range_aggregated_as_reference() {
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let bdoc = b.add_document(Document::new("/@test/b.ts").as_module());
        let foo = b.add_symbol(SymbolKind::Function, "foo");
        b.export_symbol(foo);
        b.declare(foo, Declaration::new(a, Range::on_line(0, 16, 19)));
        b.add_reference(foo, ReferenceSite::import(bdoc, Range::on_line(0, 9, 12)));
        let output = run(b);

        let import_range = output.aggregates[0].shards[1].references[0];
        match output.graph.get(import_range).unwrap().as_vertex() {
            Some(Vertex::Range { tag, .. }) => {
                assert_eq!(
                    serde_json::to_value(tag).unwrap()["type"],
                    serde_json::json!("definition")
                );
            }
            other => panic!("expected range, got {:?}", other),
        }
    }

    #[test]
    fn item_edges_follow_document_order_and_property_order() {
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let foo = b.add_symbol(SymbolKind::Function, "foo");
        let bar = b.add_symbol(SymbolKind::Function, "bar");
        b.declare(foo, Declaration::new(a, Range::on_line(0, 9, 12)));
        b.declare(bar, Declaration::new(a, Range::on_line(1, 9, 12)));
        b.add_reference(bar, ReferenceSite::new(a, Range::on_line(2, 0, 3)));
        b.add_reference(foo, ReferenceSite::new(a, Range::on_line(3, 0, 3)));
        let output = run(b);

        let foo_result = output.aggregates[0].result;
        let bar_result = output.aggregates[1].result;
        let edges: Vec<(ElementId, ItemProperty)> = items(&output)
            .into_iter()
            .map(|(out_v, _, _, property)| (out_v, property))
            .collect();
        assert_eq!(
            edges,
            vec![
                (foo_result, ItemProperty::Definitions),
                (foo_result, ItemProperty::References),
                (bar_result, ItemProperty::Definitions),
                (bar_result, ItemProperty::References),
            ]
        );
    }

    #[test]
    fn reference_ranges_are_emitted_in_source_order() {
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let foo = b.add_symbol(SymbolKind::Function, "foo");
        b.declare(foo, Declaration::new(a, Range::on_line(0, 9, 12)));
        b.add_reference(foo, ReferenceSite::new(a, Range::on_line(5, 0, 3)));
        b.add_reference(foo, ReferenceSite::new(a, Range::on_line(2, 0, 3)));
        b.add_reference(foo, ReferenceSite::new(a, Range::on_line(2, 4, 7)));
        let output = run(b);

        let starts: Vec<(u32, u32)> = output.aggregates[0].shards[0]
            .references
            .iter()
            .map(|id| match output.graph.get(*id).unwrap().as_vertex() {
                Some(Vertex::Range { start, .. }) => (start.line, start.character),
                _ => panic!("not a range"),
            })
            .collect();
        assert_eq!(starts, vec![(2, 0), (2, 4), (5, 0)]);
    }

    #[test]
    fn sites_outside_project_documents_open_no_aggregate() {
        // a.ts: function foo() {}   only usages: a dependency file and an unknown document
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let lib = b.add_document(
            Document::new("/@test/node_modules/lib/index.d.ts")
                .as_module()
                .as_external(),
        );
        let foo = b.add_symbol(SymbolKind::Function, "foo");
        b.declare(foo, Declaration::new(a, Range::on_line(0, 9, 12)));
        b.add_reference(foo, ReferenceSite::new(lib, Range::on_line(4, 2, 5)));
        b.add_reference(foo, ReferenceSite::new(DocumentId::new(9), Range::on_line(0, 0, 3)));
        let output = run(b);

        assert!(output.aggregates.is_empty());
        assert!(items(&output).is_empty());
        let results = output
            .graph
            .elements()
            .iter()
            .filter(|element| matches!(element.as_vertex(), Some(Vertex::ReferenceResult {})))
            .count();
        assert_eq!(results, 0);
        assert!(!output
            .graph
            .edges()
            .any(|(_, edge)| matches!(edge, Edge::References { .. })));

        let node = output.nodes.get(output.nodes.canonical(foo).unwrap()).unwrap();
        assert!(node.moniker(MonikerKind::Local).is_none());
        assert_eq!(output.stats.skipped, 1);
    }

    #[test]
    fn unreferenced_symbols_have_no_reference_result() {
        let mut b = ProgramBuilder::new();
        let a = b.add_document(Document::new("/@test/a.ts").as_module());
        let x = b.add_symbol(SymbolKind::Variable, "x");
        b.export_symbol(x);
        b.declare(x, Declaration::new(a, Range::on_line(0, 13, 14)));
        let output = run(b);

        assert!(output.aggregates.is_empty());
        assert!(items(&output).is_empty());
    }
}
