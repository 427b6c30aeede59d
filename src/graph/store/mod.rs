//! Knowledge graph storage using petgraph + redb
//!
//! The store owns every vertex and every typed, weighted, directed edge.
//! Vertices are deduplicated by [`VertexKey`]; edges by `(source, type,
//! destination)`. Re-inserting an existing edge increments its weight.
//! The graph only grows: there is no deletion path.
//!
//! All state sits behind one `RwLock`, so each insert-or-increment is atomic
//! with respect to concurrent callers: no duplicate edges, no lost increments.

use anyhow::{Context, Result};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef as _;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use super::interchange::{EdgeRecord, GraphDocument, VertexRecord};
use super::key::{resolve, VertexKey};
use super::store_models::{
    EdgeRef, GraphStats, MergeStats, Metadata, OverlapReport, Outcome, Relation, Vertex, VertexRef,
};
use crate::error::{GraphError, GraphResult};
use crate::schema::{EdgeKind, SchemaRegistry, VertexKind};

struct GraphInner {
    graph: DiGraph<Vertex, Relation>,
    vertex_index: HashMap<VertexKey, NodeIndex>,
    edge_index: HashMap<(NodeIndex, EdgeKind, NodeIndex), EdgeIndex>,
}

impl GraphInner {
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            vertex_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    fn edge_ref(&self, idx: EdgeIndex) -> Option<EdgeRef> {
        let (src, dst) = self.graph.edge_endpoints(idx)?;
        let relation = self.graph.edge_weight(idx)?;
        Some(EdgeRef {
            index: idx,
            src: self.graph.node_weight(src)?.key.clone(),
            kind: relation.kind,
            dst: self.graph.node_weight(dst)?.key.clone(),
            weight: relation.weight,
        })
    }
}

/// Long-lived knowledge graph store
pub struct GraphStore {
    inner: RwLock<GraphInner>,
    registry: Arc<SchemaRegistry>,
    /// Persistence layer (optional)
    db: Option<redb::Database>,
    db_path: Option<PathBuf>,
}

// redb table definitions
const VERTICES_TABLE: redb::TableDefinition<&str, &[u8]> = redb::TableDefinition::new("vertices");
const EDGES_TABLE: redb::TableDefinition<&str, &[u8]> = redb::TableDefinition::new("edges");

impl GraphStore {
    /// Create or open a persistent graph store in the given directory
    pub fn open(db_path: &Path, registry: Arc<SchemaRegistry>) -> Result<Self> {
        std::fs::create_dir_all(db_path)
            .with_context(|| format!("Failed to create {}", db_path.display()))?;

        let db_file = db_path.join("graph.redb");
        let db = redb::Database::create(&db_file).context("Failed to open redb database")?;

        let store = Self {
            inner: RwLock::new(GraphInner::new()),
            registry,
            db: Some(db),
            db_path: Some(db_path.to_path_buf()),
        };

        store.load()?;
        debug!(
            "Opened graph at {} ({} vertices, {} edges)",
            db_file.display(),
            store.vertex_count(),
            store.edge_count()
        );

        Ok(store)
    }

    /// Create an in-memory only store (no persistence)
    pub fn in_memory(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            inner: RwLock::new(GraphInner::new()),
            registry,
            db: None,
            db_path: None,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    // ==================== Lock Helpers ====================
    //
    // A poisoned lock means a thread panicked mid-insert and the indices may
    // disagree with the graph. That is unrecoverable.

    fn read(&self) -> RwLockReadGuard<'_, GraphInner> {
        self.inner
            .read()
            .expect("graph lock poisoned: a thread panicked while holding this lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphInner> {
        self.inner
            .write()
            .expect("graph lock poisoned: a thread panicked while holding this lock")
    }

    // ==================== Vertex Operations ====================

    /// Insert a vertex, or return the existing one with the same `(name, type)`
    pub fn insert_vertex(
        &self,
        name: &str,
        kind: VertexKind,
        metadata: Metadata,
    ) -> (VertexRef, Outcome) {
        self.insert_vertex_keyed(resolve(name, kind), metadata)
    }

    /// Insert a vertex under an already-resolved key.
    ///
    /// On a duplicate, counter fields declared by the schema are summed into
    /// the existing vertex and every other field is discarded.
    pub fn insert_vertex_keyed(&self, key: VertexKey, metadata: Metadata) -> (VertexRef, Outcome) {
        let mut inner = self.write();

        if let Some(&idx) = inner.vertex_index.get(&key) {
            if !metadata.is_empty() {
                if let Some(existing) = inner.graph.node_weight_mut(idx) {
                    accumulate_counters(&self.registry, existing, metadata);
                }
            }
            return (VertexRef { index: idx, key }, Outcome::Matched);
        }

        debug!("vertex {} was not in graph, inserted", key);
        let idx = inner.graph.add_node(Vertex {
            key: key.clone(),
            metadata,
        });
        inner.vertex_index.insert(key.clone(), idx);
        (VertexRef { index: idx, key }, Outcome::Created)
    }

    pub fn find_vertex(&self, key: &VertexKey) -> Option<Vertex> {
        let inner = self.read();
        inner
            .vertex_index
            .get(key)
            .and_then(|&idx| inner.graph.node_weight(idx).cloned())
    }

    pub fn contains_vertex(&self, key: &VertexKey) -> bool {
        self.read().vertex_index.contains_key(key)
    }

    /// All vertices of one type
    pub fn vertices_by_kind(&self, kind: VertexKind) -> Vec<Vertex> {
        self.read()
            .graph
            .node_weights()
            .filter(|v| v.kind() == kind)
            .cloned()
            .collect()
    }

    // ==================== Edge Operations ====================

    /// Insert a new edge with weight 1, or increment the existing edge's weight.
    ///
    /// Both endpoints must already exist; the pipeline inserts them first.
    pub fn insert_edge(
        &self,
        src: &VertexKey,
        kind: EdgeKind,
        dst: &VertexKey,
    ) -> GraphResult<(EdgeRef, Outcome)> {
        self.insert_edge_weighted(src, kind, dst, 1)
    }

    /// Insert-or-increment by `weight` observations at once (merge and load).
    pub(crate) fn insert_edge_weighted(
        &self,
        src: &VertexKey,
        kind: EdgeKind,
        dst: &VertexKey,
        weight: u64,
    ) -> GraphResult<(EdgeRef, Outcome)> {
        let mut inner = self.write();

        let (from, to) = match (inner.vertex_index.get(src), inner.vertex_index.get(dst)) {
            (Some(&from), Some(&to)) => (from, to),
            _ => {
                return Err(GraphError::DanglingEdgeReference {
                    src: src.to_string(),
                    dst: dst.to_string(),
                })
            }
        };

        let (idx, outcome) = match inner.edge_index.get(&(from, kind, to)).copied() {
            Some(idx) => {
                if let Some(relation) = inner.graph.edge_weight_mut(idx) {
                    relation.weight = relation.weight.saturating_add(weight);
                    debug!(
                        edge_type = %kind,
                        weight = relation.weight,
                        %src,
                        %dst,
                        "Incrementing weight of existing directed edge"
                    );
                }
                (idx, Outcome::Matched)
            }
            None => {
                debug!("Inserting directed edge of type {} from {} to {}", kind, src, dst);
                let idx = inner.graph.add_edge(from, to, Relation { kind, weight });
                inner.edge_index.insert((from, kind, to), idx);
                (idx, Outcome::Created)
            }
        };

        let edge = EdgeRef {
            index: idx,
            src: src.clone(),
            kind,
            dst: dst.clone(),
            weight: inner.graph.edge_weight(idx).map_or(weight, |r| r.weight),
        };
        Ok((edge, outcome))
    }

    pub fn find_edge(&self, src: &VertexKey, kind: EdgeKind, dst: &VertexKey) -> Option<EdgeRef> {
        let inner = self.read();
        let from = *inner.vertex_index.get(src)?;
        let to = *inner.vertex_index.get(dst)?;
        let idx = *inner.edge_index.get(&(from, kind, to))?;
        inner.edge_ref(idx)
    }

    /// Edges leaving a vertex
    pub fn out_edges(&self, key: &VertexKey) -> Vec<EdgeRef> {
        self.directed_edges(key, Direction::Outgoing)
    }

    /// Edges entering a vertex
    pub fn in_edges(&self, key: &VertexKey) -> Vec<EdgeRef> {
        self.directed_edges(key, Direction::Incoming)
    }

    fn directed_edges(&self, key: &VertexKey, direction: Direction) -> Vec<EdgeRef> {
        let inner = self.read();
        match inner.vertex_index.get(key) {
            Some(&idx) => inner
                .graph
                .edges_directed(idx, direction)
                .filter_map(|e| inner.edge_ref(e.id()))
                .collect(),
            None => vec![],
        }
    }

    // ==================== Reporting ====================

    pub fn vertex_count(&self) -> usize {
        self.read().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.read().graph.edge_count()
    }

    /// Sum of all edge weights (total observations)
    pub fn total_weight(&self) -> u64 {
        self.read().graph.edge_weights().map(|r| r.weight).sum()
    }

    pub fn stats(&self) -> GraphStats {
        let inner = self.read();
        let mut stats = GraphStats {
            vertices: inner.graph.node_count(),
            edges: inner.graph.edge_count(),
            ..GraphStats::default()
        };
        for vertex in inner.graph.node_weights() {
            *stats.vertices_by_kind.entry(vertex.kind()).or_default() += 1;
        }
        for relation in inner.graph.edge_weights() {
            *stats.edges_by_kind.entry(relation.kind).or_default() += 1;
            stats.total_weight += relation.weight;
        }
        stats
    }

    /// How many of the given keys are already in the graph
    pub fn overlap(&self, referenced: &HashSet<VertexKey>) -> OverlapReport {
        let inner = self.read();
        OverlapReport {
            graph_vertices: inner.graph.node_count(),
            referenced_vertices: referenced.len(),
            shared_vertices: referenced
                .iter()
                .filter(|k| inner.vertex_index.contains_key(*k))
                .count(),
        }
    }

    // ==================== Iteration ====================
    //
    // The iterators hold the read lock until dropped. Do not insert into the
    // same store while one is alive.

    /// Lazy sequence of all vertices in insertion order
    pub fn vertices(&self) -> Vertices<'_> {
        Vertices {
            inner: self.read(),
            next: 0,
        }
    }

    /// Lazy sequence of all edges in insertion order
    pub fn edges(&self) -> Edges<'_> {
        Edges {
            inner: self.read(),
            next: 0,
        }
    }

    // ==================== Merge ====================

    /// Copy every vertex and edge of `other` into this store.
    ///
    /// Equivalent to replaying all of `other`'s observations: vertices dedupe
    /// by key and edge weights add.
    pub fn merge_from(&self, other: &GraphStore) -> MergeStats {
        // Snapshot first so merging a store into itself cannot deadlock
        let doc = other.to_document();
        let mut stats = MergeStats::default();

        for record in doc.vertices {
            let key = VertexKey::new(record.name, record.kind);
            match self.insert_vertex_keyed(key, record.metadata).1 {
                Outcome::Created => stats.vertices_created += 1,
                Outcome::Matched => stats.vertices_matched += 1,
            }
        }

        for record in doc.edges {
            let src = VertexKey::new(record.src.name, record.src.kind);
            let dst = VertexKey::new(record.dst.name, record.dst.kind);
            // Endpoints were inserted above; a failure here means `other` was inconsistent
            match self.insert_edge_weighted(&src, record.kind, &dst, record.weight) {
                Ok((_, Outcome::Created)) => stats.edges_created += 1,
                Ok((_, Outcome::Matched)) => stats.edges_incremented += 1,
                Err(e) => tracing::warn!("Skipping edge during merge: {}", e),
            }
        }

        debug!(
            "Merged graph: {} new vertices, {} new edges, {} incremented",
            stats.vertices_created, stats.edges_created, stats.edges_incremented
        );
        stats
    }

    // ==================== Persistence ====================

    /// Persist graph to redb
    pub fn save(&self) -> Result<()> {
        let db = match &self.db {
            Some(db) => db,
            None => return Ok(()),
        };

        let doc = self.to_document();

        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(VERTICES_TABLE)?;
            for record in &doc.vertices {
                let key = format!("vertex:{}:{}", record.kind, record.name);
                let value = serde_json::to_vec(record)?;
                table.insert(key.as_str(), value.as_slice())?;
            }

            // Save edges as a single entry
            let edges_data = serde_json::to_vec(&doc.edges)?;
            let mut edges_table = write_txn.open_table(EDGES_TABLE)?;
            edges_table.insert("__edges__", edges_data.as_slice())?;
        }
        write_txn.commit()?;

        debug!(
            "Saved {} vertices and {} edges",
            doc.vertices.len(),
            doc.edges.len()
        );
        Ok(())
    }

    /// Load graph from redb through the same checks as an interchange document
    fn load(&self) -> Result<()> {
        let db = match &self.db {
            Some(db) => db,
            None => return Ok(()),
        };

        let read_txn = db.begin_read()?;

        // Tables don't exist yet on a fresh database
        let vertices_table = match read_txn.open_table(VERTICES_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut vertices: Vec<VertexRecord> = Vec::new();
        for item in vertices_table.range::<&str>(..)? {
            let (key, value) = item?;
            if key.value().starts_with("vertex:") {
                vertices.push(serde_json::from_slice(value.value())?);
            }
        }

        let edges: Vec<EdgeRecord> = match read_txn.open_table(EDGES_TABLE) {
            Ok(table) => match table.get("__edges__")? {
                Some(entry) => serde_json::from_slice(entry.value())?,
                None => Vec::new(),
            },
            Err(redb::TableError::TableDoesNotExist(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let doc = GraphDocument::new(vertices, edges);
        self.apply_document(&doc)
            .context("Stored graph failed validation")?;
        Ok(())
    }
}

/// Sum declared counter fields into `existing`; discard everything else.
fn accumulate_counters(registry: &SchemaRegistry, existing: &mut Vertex, metadata: Metadata) {
    let kind = existing.kind();
    for (field, value) in metadata {
        if !registry.is_counter(kind, &field) {
            continue;
        }
        match existing.metadata.get_mut(&field) {
            Some(current) => match (current.as_i64(), value.as_i64()) {
                (Some(a), Some(b)) => *current = serde_json::Value::from(a.saturating_add(b)),
                _ => warn!(
                    "Dropping non-integer counter update {}.{}: {} + {}",
                    existing.key, field, current, value
                ),
            },
            None => {
                existing.metadata.insert(field, value);
            }
        }
    }
}

/// Vertex iterator holding the store's read lock
pub struct Vertices<'a> {
    inner: RwLockReadGuard<'a, GraphInner>,
    next: usize,
}

impl Iterator for Vertices<'_> {
    type Item = Vertex;

    fn next(&mut self) -> Option<Vertex> {
        let vertex = self.inner.graph.node_weight(NodeIndex::new(self.next))?.clone();
        self.next += 1;
        Some(vertex)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.inner.graph.node_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Edge iterator holding the store's read lock
pub struct Edges<'a> {
    inner: RwLockReadGuard<'a, GraphInner>,
    next: usize,
}

impl Iterator for Edges<'_> {
    type Item = EdgeRef;

    fn next(&mut self) -> Option<EdgeRef> {
        let edge = self.inner.edge_ref(EdgeIndex::new(self.next))?;
        self.next += 1;
        Some(edge)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.inner.graph.edge_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests;
