//! relgraph - incremental knowledge graph construction
//!
//! Accumulates relation triples from many extraction passes into one typed,
//! weighted, directed multigraph. Vertices are identified by their exact
//! `(name, type)` key; repeated observations of an edge increment its weight.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod schema;
pub mod synth;

pub use error::{GraphError, GraphResult, SchemaViolation};
pub use graph::{GraphStore, VertexKey};
pub use pipeline::{PassSummary, Pipeline, Triple};
pub use schema::{EdgeKind, SchemaRegistry, VertexKind};
