use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::key::VertexKey;
use crate::schema::{EdgeKind, VertexKind};

/// Vertex metadata: string keys to scalar or string values
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A vertex in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub key: VertexKey,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Vertex {
    pub fn new(name: &str, kind: VertexKind) -> Self {
        Self {
            key: VertexKey::new(name, kind),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(field.to_string(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn kind(&self) -> VertexKind {
        self.key.kind
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.metadata.get(field).and_then(|v| v.as_i64())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).and_then(|v| v.as_str())
    }
}

/// Payload of a directed edge: its type and observation count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: EdgeKind,
    pub weight: u64,
}

/// Whether an insert created new state or matched existing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Created,
    Matched,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => f.write_str("created"),
            Outcome::Matched => f.write_str("matched"),
        }
    }
}

/// Handle to a stored vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexRef {
    pub index: NodeIndex,
    pub key: VertexKey,
}

/// Snapshot of a stored edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRef {
    pub index: EdgeIndex,
    pub src: VertexKey,
    pub kind: EdgeKind,
    pub dst: VertexKey,
    pub weight: u64,
}

/// Size of the overlap between the graph and the vertices a pass refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverlapReport {
    /// Unique vertices already in the graph
    pub graph_vertices: usize,
    /// Unique vertices the incoming triples refer to
    pub referenced_vertices: usize,
    /// Referenced vertices that are already in the graph
    pub shared_vertices: usize,
}

/// Result of merging one store into another
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub vertices_created: usize,
    pub vertices_matched: usize,
    pub edges_created: usize,
    pub edges_incremented: usize,
}

/// Graph size breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub vertices: usize,
    pub edges: usize,
    pub total_weight: u64,
    pub vertices_by_kind: BTreeMap<VertexKind, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}
