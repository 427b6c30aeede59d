//! Error types for graph construction
//!
//! "Vertex already exists" and "edge already exists" are not errors: they are
//! reported through [`Outcome`](crate::graph::Outcome). Everything here is a
//! genuine failure of a single triple, a load, or a schema definition.

use thiserror::Error;

/// A reference to a type or field the schema registry does not know about.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("unknown vertex type '{0}'")]
    UnknownVertexType(String),

    #[error("unknown edge type '{0}'")]
    UnknownEdgeType(String),

    #[error("metadata field '{field}' is not declared for vertex type '{vertex_type}'")]
    DisallowedMetadata { vertex_type: String, field: String },

    #[error("counter field '{field}' of vertex type '{vertex_type}' must be an integer")]
    NonIntegerCounter { vertex_type: String, field: String },

    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),
}

/// Errors raised by the graph store, the ingestion pipeline and graph loading.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("dangling edge reference: {src} -> {dst} (endpoint not in graph)")]
    DanglingEdgeReference { src: String, dst: String },

    #[error("serialization mismatch: {0}")]
    SerializationMismatch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// True for per-triple failures the pipeline recovers from by skipping the triple.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GraphError::Schema(_) | GraphError::DanglingEdgeReference { .. }
        )
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_converts() {
        let err: GraphError = SchemaViolation::UnknownEdgeType("teleports".into()).into();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("teleports"));
    }

    #[test]
    fn test_mismatch_is_fatal() {
        let err = GraphError::SerializationMismatch("duplicate vertex".into());
        assert!(!err.is_recoverable());
    }
}
