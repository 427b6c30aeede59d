use std::sync::Arc;

use proptest::prelude::*;
use relgraph::graph::{GraphDocument, GraphStore, Metadata, VertexKey};
use relgraph::pipeline::{Pipeline, Triple};
use relgraph::schema::{EdgeKind, SchemaRegistry, VertexKind};
use relgraph::synth::{SynthDefs, SynthFixture};

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::builtin())
}

fn pipeline() -> Pipeline {
    Pipeline::new(GraphStore::in_memory(registry()))
}

/// Canonical form: equal graphs give equal snapshots
fn snapshot(store: &GraphStore) -> GraphDocument {
    let mut doc = store.to_document();
    doc.canonicalize();
    doc
}

// Small pools so that triples collide often.
fn triple_strategy() -> impl Strategy<Value = Triple> {
    let name = prop::sample::select(vec!["a", "b", "c", "parms", "β"]);
    let vertex = prop::sample::select(vec!["Func", "Var", "Value"]);
    let edge = prop::sample::select(vec!["output", "val", "takes", "comp"]);
    (name.clone(), vertex.clone(), edge, name, vertex).prop_map(|(sn, st, e, dn, dt)| {
        Triple::new(sn, st, e, dn, dt)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn repeated_triple_yields_one_edge_with_weight_n(triple in triple_strategy(), n in 1usize..20) {
        let pipeline = pipeline();
        let batch = vec![triple.clone(); n];
        let summary = pipeline.ingest("repeat", &batch);

        prop_assert!(summary.is_clean());
        prop_assert_eq!(pipeline.graph().edge_count(), 1);
        prop_assert_eq!(pipeline.graph().total_weight(), n as u64);
        prop_assert_eq!(summary.edges_created, 1);
        prop_assert_eq!(summary.edges_incremented, n - 1);
    }

    #[test]
    fn vertex_insert_is_idempotent(name in "[a-zA-Z_][a-zA-Z0-9_ ]{0,12}", k in 1usize..10) {
        let store = GraphStore::in_memory(registry());
        let key = VertexKey::new(name.clone(), VertexKind::Var);
        let (first, _) = store.insert_vertex(&name, VertexKind::Var, Metadata::new());
        for _ in 1..k {
            let (again, _) = store.insert_vertex(&name, VertexKind::Var, Metadata::new());
            prop_assert_eq!(&again, &first);
        }
        prop_assert_eq!(store.vertex_count(), 1);
        prop_assert!(store.contains_vertex(&key));
    }

    #[test]
    fn partitioning_into_passes_does_not_change_the_graph(
        triples in prop::collection::vec(triple_strategy(), 0..40),
        split in 0usize..40,
    ) {
        let split = split.min(triples.len());

        let whole = pipeline();
        whole.ingest("all", &triples);

        // Second half first, as two separate passes
        let parts = pipeline();
        parts.ingest("second", &triples[split..]);
        parts.ingest("first", &triples[..split]);

        prop_assert_eq!(snapshot(whole.graph()), snapshot(parts.graph()));
    }

    #[test]
    fn shuffled_passes_give_the_same_graph(
        triples in prop::collection::vec(triple_strategy(), 0..30).prop_shuffle(),
        reference in prop::collection::vec(triple_strategy(), 0..30),
    ) {
        let a = pipeline();
        let b = pipeline();
        for (i, t) in triples.iter().chain(reference.iter()).enumerate() {
            a.ingest(&format!("a{i}"), std::slice::from_ref(t));
        }
        for (i, t) in reference.iter().rev().chain(triples.iter().rev()).enumerate() {
            b.ingest(&format!("b{i}"), std::slice::from_ref(t));
        }
        prop_assert_eq!(snapshot(a.graph()), snapshot(b.graph()));
    }

    #[test]
    fn serialize_round_trips(triples in prop::collection::vec(triple_strategy(), 0..40)) {
        let pipeline = pipeline();
        pipeline.ingest("rt", &triples);

        let json = pipeline.graph().serialize().unwrap();
        let loaded = GraphStore::deserialize(&json, registry()).unwrap();

        prop_assert_eq!(loaded.vertex_count(), pipeline.graph().vertex_count());
        prop_assert_eq!(loaded.edge_count(), pipeline.graph().edge_count());
        prop_assert_eq!(snapshot(&loaded), snapshot(pipeline.graph()));
    }

    #[test]
    fn unknown_edge_type_never_changes_counts(
        triples in prop::collection::vec(triple_strategy(), 0..20),
        at in 0usize..20,
    ) {
        let clean = pipeline();
        clean.ingest("clean", &triples);

        let mut tainted_batch = triples.clone();
        let at = at.min(tainted_batch.len());
        tainted_batch.insert(at, Triple::new("a", "Var", "teleports", "b", "Var"));
        let tainted = pipeline();
        let summary = tainted.ingest("tainted", &tainted_batch);

        prop_assert_eq!(summary.violations.len(), 1);
        prop_assert_eq!(summary.violations[0].index, at);
        prop_assert_eq!(snapshot(clean.graph()), snapshot(tainted.graph()));
    }

    #[test]
    fn merge_equals_replay(
        left in prop::collection::vec(triple_strategy(), 0..20),
        right in prop::collection::vec(triple_strategy(), 0..20),
    ) {
        let replayed = pipeline();
        replayed.ingest("left", &left);
        replayed.ingest("right", &right);

        let a = pipeline();
        a.ingest("left", &left);
        let b = pipeline();
        b.ingest("right", &right);
        a.graph().merge_from(b.graph());

        prop_assert_eq!(snapshot(a.graph()), snapshot(replayed.graph()));
    }

    #[test]
    fn synthetic_fixtures_have_no_dangling_edges(
        seed in any::<u64>(),
        vertices in 2usize..30,
        edge_fraction in 0.0f64..1.0,
    ) {
        let available = vertices * (vertices - 1);
        let edges = ((available as f64) * edge_fraction) as usize;
        let defs = SynthDefs::homogeneous(VertexKind::Concept, vertices, EdgeKind::Cooccur, edges);
        let fixture = SynthFixture::generate(seed, &defs).unwrap();

        let pipeline = pipeline();
        let (vertex_pass, edge_pass) = fixture.load_into(&pipeline, "synthetic");
        prop_assert!(vertex_pass.is_clean());
        prop_assert!(edge_pass.is_clean());
        prop_assert_eq!(pipeline.graph().vertex_count(), vertices);
        prop_assert_eq!(pipeline.graph().edge_count(), edges);
        prop_assert_eq!(edge_pass.vertices_created, 0);
    }
}
