//! Portable graph interchange document
//!
//! A graph serializes to a vertex list (type + metadata) and an edge list
//! (type + weight) and loads back into an equivalent store. Loading is strict:
//! duplicated vertex records, conflicting duplicate edge records, zero weights
//! and edges to unknown vertices are upstream corruption and fail the load.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "vertices": [{ "name": "A", "type": "Func" }],
//!   "edges": [{ "src": { "name": "A", "type": "Func" }, "type": "output",
//!               "dst": { "name": "B", "type": "Var" }, "weight": 2 }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

use super::key::VertexKey;
use super::store::GraphStore;
use super::store_models::Metadata;
use crate::error::{GraphError, GraphResult};
use crate::schema::{EdgeKind, SchemaRegistry, VertexKind};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VertexKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VertexKind,
}

impl EndpointRecord {
    fn key(&self) -> VertexKey {
        VertexKey::new(self.name.clone(), self.kind)
    }
}

impl From<&VertexKey> for EndpointRecord {
    fn from(key: &VertexKey) -> Self {
        Self {
            name: key.name.clone(),
            kind: key.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub src: EndpointRecord,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub dst: EndpointRecord,
    pub weight: u64,
}

/// Serialized form of a whole graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub format_version: u32,
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocument {
    pub fn new(vertices: Vec<VertexRecord>, edges: Vec<EdgeRecord>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            vertices,
            edges,
        }
    }

    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sort records so that equal graphs produce equal documents
    pub fn canonicalize(&mut self) {
        self.vertices
            .sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        self.edges.sort_by(|a, b| {
            (&a.src, a.kind, &a.dst, a.weight).cmp(&(&b.src, b.kind, &b.dst, b.weight))
        });
    }

    /// Check the document against the store invariants and the schema.
    ///
    /// Returns the edges to load, with identical duplicate records collapsed.
    fn checked_edges(&self, registry: &SchemaRegistry) -> GraphResult<Vec<&EdgeRecord>> {
        if self.format_version != FORMAT_VERSION {
            return Err(GraphError::SerializationMismatch(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }

        let mut seen_vertices: HashSet<VertexKey> = HashSet::with_capacity(self.vertices.len());
        for record in &self.vertices {
            if !registry.has_vertex_kind(record.kind) {
                return Err(crate::error::SchemaViolation::UnknownVertexType(
                    record.kind.to_string(),
                )
                .into());
            }
            registry.check_metadata(record.kind, &record.metadata)?;

            let key = VertexKey::new(record.name.clone(), record.kind);
            if !seen_vertices.insert(key.clone()) {
                return Err(GraphError::SerializationMismatch(format!(
                    "duplicate vertex record {key}"
                )));
            }
        }

        let mut seen_edges: HashMap<(VertexKey, EdgeKind, VertexKey), u64> =
            HashMap::with_capacity(self.edges.len());
        let mut edges = Vec::with_capacity(self.edges.len());
        for record in &self.edges {
            if !registry.has_edge_kind(record.kind) {
                return Err(
                    crate::error::SchemaViolation::UnknownEdgeType(record.kind.to_string()).into(),
                );
            }

            let (src, dst) = (record.src.key(), record.dst.key());
            if record.weight == 0 {
                return Err(GraphError::SerializationMismatch(format!(
                    "edge {src} -{}-> {dst} has weight 0",
                    record.kind
                )));
            }
            if !seen_vertices.contains(&src) || !seen_vertices.contains(&dst) {
                return Err(GraphError::DanglingEdgeReference {
                    src: src.to_string(),
                    dst: dst.to_string(),
                });
            }

            match seen_edges.get(&(src.clone(), record.kind, dst.clone())) {
                Some(&weight) if weight == record.weight => {
                    warn!(
                        "Collapsing repeated edge record {} -{}-> {}",
                        src, record.kind, dst
                    );
                }
                Some(&weight) => {
                    return Err(GraphError::SerializationMismatch(format!(
                        "edge {src} -{}-> {dst} recorded with conflicting weights {weight} and {}",
                        record.kind, record.weight
                    )));
                }
                None => {
                    seen_edges.insert((src, record.kind, dst), record.weight);
                    edges.push(record);
                }
            }
        }

        Ok(edges)
    }
}

impl GraphStore {
    /// Snapshot the whole graph, vertices and edges in insertion order
    pub fn to_document(&self) -> GraphDocument {
        let vertices = self
            .vertices()
            .map(|v| VertexRecord {
                name: v.key.name,
                kind: v.key.kind,
                metadata: v.metadata,
            })
            .collect();
        let edges = self
            .edges()
            .map(|e| EdgeRecord {
                src: EndpointRecord::from(&e.src),
                kind: e.kind,
                dst: EndpointRecord::from(&e.dst),
                weight: e.weight,
            })
            .collect();
        GraphDocument::new(vertices, edges)
    }

    pub fn serialize(&self) -> GraphResult<String> {
        self.to_document().to_json()
    }

    /// Build an in-memory store from a document
    pub fn from_document(doc: &GraphDocument, registry: Arc<SchemaRegistry>) -> GraphResult<Self> {
        let store = GraphStore::in_memory(registry);
        store.apply_document(doc)?;
        Ok(store)
    }

    pub fn deserialize(json: &str, registry: Arc<SchemaRegistry>) -> GraphResult<Self> {
        Self::from_document(&GraphDocument::from_json(json)?, registry)
    }

    /// Validate `doc` completely, then insert its records.
    ///
    /// Nothing is inserted if validation fails.
    pub(crate) fn apply_document(&self, doc: &GraphDocument) -> GraphResult<()> {
        let edges = doc.checked_edges(self.registry())?;

        for record in &doc.vertices {
            let key = VertexKey::new(record.name.clone(), record.kind);
            self.insert_vertex_keyed(key, record.metadata.clone());
        }
        for record in edges {
            self.insert_edge_weighted(
                &record.src.key(),
                record.kind,
                &record.dst.key(),
                record.weight,
            )?;
        }
        Ok(())
    }
}
