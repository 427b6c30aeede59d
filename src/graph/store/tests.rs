use super::*;
use serde_json::json;
use std::thread;
use tempfile::tempdir;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::builtin())
}

fn key(name: &str, kind: VertexKind) -> VertexKey {
    VertexKey::new(name, kind)
}

#[test]
fn test_basic_operations() {
    let store = GraphStore::in_memory(registry());

    let mut meta = Metadata::new();
    meta.insert("path".into(), json!("ScalingModel.jl"));
    meta.insert("line".into(), json!(12));

    let (func, outcome) = store.insert_vertex("micro_1(du, u, parms, time)", VertexKind::Func, meta);
    assert_eq!(outcome, Outcome::Created);
    let (var, _) = store.insert_vertex("parms", VertexKind::Var, Metadata::new());

    assert_eq!(store.vertex_count(), 2);
    assert_eq!(store.vertices_by_kind(VertexKind::Func).len(), 1);
    assert!(store.contains_vertex(&var.key));

    let f = store.find_vertex(&func.key).unwrap();
    assert_eq!(f.get_i64("line"), Some(12));
    assert_eq!(f.get_str("path"), Some("ScalingModel.jl"));
}

#[test]
fn test_vertex_insert_is_idempotent() {
    let store = GraphStore::in_memory(registry());
    let (first, a) = store.insert_vertex("β", VertexKind::Var, Metadata::new());
    let (second, b) = store.insert_vertex("β", VertexKind::Var, Metadata::new());

    assert_eq!(a, Outcome::Created);
    assert_eq!(b, Outcome::Matched);
    assert_eq!(first, second);
    assert_eq!(store.vertex_count(), 1);

    // Same name, different type is a different vertex
    store.insert_vertex("β", VertexKind::Concept, Metadata::new());
    assert_eq!(store.vertex_count(), 2);
}

#[test]
fn test_edge_weight_increments() {
    // A -output-> B twice, B -val-> C once
    let store = GraphStore::in_memory(registry());
    let (a, _) = store.insert_vertex("A", VertexKind::Func, Metadata::new());
    let (b, _) = store.insert_vertex("B", VertexKind::Var, Metadata::new());
    let (c, _) = store.insert_vertex("C", VertexKind::Value, Metadata::new());

    let (first, o1) = store.insert_edge(&a.key, EdgeKind::Output, &b.key).unwrap();
    let (second, o2) = store.insert_edge(&a.key, EdgeKind::Output, &b.key).unwrap();
    store.insert_edge(&b.key, EdgeKind::Val, &c.key).unwrap();

    assert_eq!((o1, o2), (Outcome::Created, Outcome::Matched));
    assert_eq!(first.weight, 1);
    assert_eq!(second.weight, 2);
    assert_eq!(first.index, second.index);

    assert_eq!(store.vertex_count(), 3);
    assert_eq!(store.edge_count(), 2);
    assert_eq!(store.total_weight(), 3);
    assert_eq!(
        store.find_edge(&a.key, EdgeKind::Output, &b.key).unwrap().weight,
        2
    );
}

#[test]
fn test_edge_type_is_part_of_identity() {
    let store = GraphStore::in_memory(registry());
    let (a, _) = store.insert_vertex("f", VertexKind::Func, Metadata::new());
    let (b, _) = store.insert_vertex("x", VertexKind::Var, Metadata::new());

    store.insert_edge(&a.key, EdgeKind::Takes, &b.key).unwrap();
    store.insert_edge(&a.key, EdgeKind::Output, &b.key).unwrap();
    // Reverse direction is its own edge too
    store.insert_edge(&b.key, EdgeKind::Takes, &a.key).unwrap();

    assert_eq!(store.edge_count(), 3);
    assert!(store.edges().all(|e| e.weight == 1));
}

#[test]
fn test_self_loop_allowed() {
    let store = GraphStore::in_memory(registry());
    let (x, _) = store.insert_vertex("x", VertexKind::Var, Metadata::new());
    store.insert_edge(&x.key, EdgeKind::Val, &x.key).unwrap();
    store.insert_edge(&x.key, EdgeKind::Val, &x.key).unwrap();

    assert_eq!(store.edge_count(), 1);
    assert_eq!(store.total_weight(), 2);
    assert_eq!(store.out_edges(&x.key).len(), 1);
    assert_eq!(store.in_edges(&x.key).len(), 1);
}

#[test]
fn test_dangling_edge_rejected() {
    let store = GraphStore::in_memory(registry());
    let (a, _) = store.insert_vertex("a", VertexKind::Var, Metadata::new());

    let err = store
        .insert_edge(&a.key, EdgeKind::Val, &key("ghost", VertexKind::Value))
        .unwrap_err();
    assert!(matches!(err, GraphError::DanglingEdgeReference { .. }));
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn test_duplicate_vertex_accumulates_counters() {
    let store = GraphStore::in_memory(registry());

    let mut first = Metadata::new();
    first.insert("path".into(), json!("a.jl"));
    first.insert("occurrences".into(), json!(2));
    store.insert_vertex("S", VertexKind::Var, first);

    let mut second = Metadata::new();
    second.insert("path".into(), json!("b.jl"));
    second.insert("line".into(), json!(40));
    second.insert("occurrences".into(), json!(3));
    let (_, outcome) = store.insert_vertex("S", VertexKind::Var, second);
    assert_eq!(outcome, Outcome::Matched);

    let s = store.find_vertex(&key("S", VertexKind::Var)).unwrap();
    assert_eq!(s.get_i64("occurrences"), Some(5));
    // First writer wins for non-counter fields, even ones it never set
    assert_eq!(s.get_str("path"), Some("a.jl"));
    assert_eq!(s.get_i64("line"), None);
}

#[test]
fn test_counter_added_when_absent() {
    let store = GraphStore::in_memory(registry());
    store.insert_vertex("1.0", VertexKind::Value, Metadata::new());

    let mut meta = Metadata::new();
    meta.insert("occurrences".into(), json!(4));
    store.insert_vertex("1.0", VertexKind::Value, meta);

    let v = store.find_vertex(&key("1.0", VertexKind::Value)).unwrap();
    assert_eq!(v.get_i64("occurrences"), Some(4));
}

#[test]
fn test_non_integer_counter_update_is_dropped() {
    let store = GraphStore::in_memory(registry());
    let mut meta = Metadata::new();
    meta.insert("occurrences".into(), json!(2));
    store.insert_vertex("x", VertexKind::Var, meta);

    let mut bad = Metadata::new();
    bad.insert("occurrences".into(), json!("many"));
    store.insert_vertex("x", VertexKind::Var, bad);

    let mut good = Metadata::new();
    good.insert("occurrences".into(), json!(1));
    store.insert_vertex("x", VertexKind::Var, good);

    let x = store.find_vertex(&key("x", VertexKind::Var)).unwrap();
    assert_eq!(x.get_i64("occurrences"), Some(3));
}

#[test]
fn test_directed_edges() {
    let store = GraphStore::in_memory(registry());
    let (m, _) = store.insert_vertex("main", VertexKind::Module, Metadata::new());
    let (f, _) = store.insert_vertex("f(x)", VertexKind::Func, Metadata::new());
    let (x, _) = store.insert_vertex("x", VertexKind::Var, Metadata::new());

    store.insert_edge(&m.key, EdgeKind::Has, &f.key).unwrap();
    store.insert_edge(&f.key, EdgeKind::Takes, &x.key).unwrap();
    store.insert_edge(&m.key, EdgeKind::Output, &x.key).unwrap();

    assert_eq!(store.out_edges(&m.key).len(), 2);
    assert_eq!(store.in_edges(&x.key).len(), 2);
    assert!(store.out_edges(&x.key).is_empty());
    assert!(store.in_edges(&key("nope", VertexKind::Var)).is_empty());

    let incoming = store.in_edges(&f.key);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].src, m.key);
    assert_eq!(incoming[0].kind, EdgeKind::Has);
}

#[test]
fn test_iteration_is_restartable() {
    let store = GraphStore::in_memory(registry());
    for name in ["a", "b", "c"] {
        store.insert_vertex(name, VertexKind::Var, Metadata::new());
    }
    store
        .insert_edge(&key("a", VertexKind::Var), EdgeKind::Val, &key("b", VertexKind::Var))
        .unwrap();

    let first: Vec<String> = store.vertices().map(|v| v.key.name).collect();
    let second: Vec<String> = store.vertices().map(|v| v.key.name).collect();
    assert_eq!(first, vec!["a", "b", "c"]);
    assert_eq!(first, second);

    let vertices = store.vertices();
    assert_eq!(vertices.size_hint(), (3, Some(3)));
    drop(vertices);

    let edges: Vec<EdgeRef> = store.edges().collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].src.name, "a");
    assert_eq!(edges[0].dst.name, "b");
}

#[test]
fn test_stats_and_overlap() {
    let store = GraphStore::in_memory(registry());
    let (a, _) = store.insert_vertex("a", VertexKind::Var, Metadata::new());
    let (b, _) = store.insert_vertex("b", VertexKind::Value, Metadata::new());
    store.insert_edge(&a.key, EdgeKind::Val, &b.key).unwrap();
    store.insert_edge(&a.key, EdgeKind::Val, &b.key).unwrap();

    let stats = store.stats();
    assert_eq!(stats.vertices, 2);
    assert_eq!(stats.edges, 1);
    assert_eq!(stats.total_weight, 2);
    assert_eq!(stats.vertices_by_kind[&VertexKind::Var], 1);
    assert_eq!(stats.edges_by_kind[&EdgeKind::Val], 1);

    let referenced: HashSet<VertexKey> =
        [a.key.clone(), key("c", VertexKind::Var)].into_iter().collect();
    let overlap = store.overlap(&referenced);
    assert_eq!(overlap.graph_vertices, 2);
    assert_eq!(overlap.referenced_vertices, 2);
    assert_eq!(overlap.shared_vertices, 1);
}

#[test]
fn test_merge_adds_weights() {
    let left = GraphStore::in_memory(registry());
    let right = GraphStore::in_memory(registry());

    for store in [&left, &right] {
        let (a, _) = store.insert_vertex("a", VertexKind::Var, Metadata::new());
        let (b, _) = store.insert_vertex("b", VertexKind::Var, Metadata::new());
        store.insert_edge(&a.key, EdgeKind::Val, &b.key).unwrap();
    }
    let (c, _) = right.insert_vertex("c", VertexKind::Concept, Metadata::new());
    right
        .insert_edge(&key("a", VertexKind::Var), EdgeKind::Implements, &c.key)
        .unwrap();

    let stats = left.merge_from(&right);
    assert_eq!(stats.vertices_created, 1);
    assert_eq!(stats.vertices_matched, 2);
    assert_eq!(stats.edges_created, 1);
    assert_eq!(stats.edges_incremented, 1);

    assert_eq!(left.vertex_count(), 3);
    assert_eq!(
        left.find_edge(&key("a", VertexKind::Var), EdgeKind::Val, &key("b", VertexKind::Var))
            .unwrap()
            .weight,
        2
    );
}

#[test]
fn test_merge_into_self_doubles_weights() {
    let store = GraphStore::in_memory(registry());
    let (a, _) = store.insert_vertex("a", VertexKind::Var, Metadata::new());
    store.insert_edge(&a.key, EdgeKind::Val, &a.key).unwrap();

    let stats = store.merge_from(&store);
    assert_eq!(stats.vertices_matched, 1);
    assert_eq!(store.vertex_count(), 1);
    assert_eq!(store.total_weight(), 2);
}

#[test]
fn test_concurrent_increments_not_lost() {
    let store = Arc::new(GraphStore::in_memory(registry()));
    let (a, _) = store.insert_vertex("a", VertexKind::Var, Metadata::new());
    let (b, _) = store.insert_vertex("b", VertexKind::Var, Metadata::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let (a, b) = (a.key.clone(), b.key.clone());
            thread::spawn(move || {
                for _ in 0..100 {
                    store.insert_edge(&a, EdgeKind::Val, &b).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.edge_count(), 1);
    assert_eq!(store.total_weight(), 800);
}

#[test]
fn test_persistence() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("graph");

    // Create and save
    {
        let store = GraphStore::open(&path, registry()).expect("create graph store");
        let mut meta = Metadata::new();
        meta.insert("occurrences".into(), json!(3));
        let (a, _) = store.insert_vertex("a", VertexKind::Var, meta);
        let (b, _) = store.insert_vertex("1", VertexKind::Value, Metadata::new());
        store.insert_edge(&a.key, EdgeKind::Val, &b.key).unwrap();
        store.insert_edge(&a.key, EdgeKind::Val, &b.key).unwrap();
        store.save().expect("save graph store");
        // Explicit drop to release lock before reopening
        drop(store);
    }

    // Reload and verify
    {
        let store = GraphStore::open(&path, registry()).expect("reload graph store");
        assert_eq!(store.vertex_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.total_weight(), 2);
        assert_eq!(
            store
                .find_vertex(&key("a", VertexKind::Var))
                .unwrap()
                .get_i64("occurrences"),
            Some(3)
        );
        assert_eq!(store.db_path(), Some(path.as_path()));
    }
}

#[test]
fn test_fresh_database_is_empty() {
    let dir = tempdir().expect("create temp dir");
    let store = GraphStore::open(dir.path(), registry()).expect("open graph store");
    assert_eq!(store.vertex_count(), 0);
    // Saving an in-memory store is a no-op
    GraphStore::in_memory(registry()).save().unwrap();
}
