//! Knowledge graph storage
//!
//! Pure Rust implementation using petgraph + redb.

pub mod interchange;
pub mod key;
pub mod store;
pub mod store_models;

pub use interchange::{EdgeRecord, EndpointRecord, GraphDocument, VertexRecord, FORMAT_VERSION};
pub use key::{resolve, EntityResolver, ExactResolver, VertexKey};
pub use store::{Edges, GraphStore, Vertices};
pub use store_models::{
    EdgeRef, GraphStats, MergeStats, Metadata, OverlapReport, Outcome, Relation, Vertex, VertexRef,
};
