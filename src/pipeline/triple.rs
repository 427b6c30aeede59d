use serde::{Deserialize, Serialize};

use crate::graph::Metadata;

/// One endpoint of an observed relation, as the extractor reported it.
///
/// The type tag is kept as raw text so that an unknown tag can be rejected
/// per triple instead of failing the whole batch at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(field.to_string(), value.into());
        self
    }
}

/// A single relation observation: (source, edge type, destination)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub src: Endpoint,
    #[serde(rename = "type")]
    pub edge: String,
    pub dst: Endpoint,
}

impl Triple {
    pub fn new(
        src_name: impl Into<String>,
        src_type: impl Into<String>,
        edge_type: impl Into<String>,
        dst_name: impl Into<String>,
        dst_type: impl Into<String>,
    ) -> Self {
        Self {
            src: Endpoint::new(src_name, src_type),
            edge: edge_type.into(),
            dst: Endpoint::new(dst_name, dst_type),
        }
    }

    pub fn from_endpoints(src: Endpoint, edge: impl Into<String>, dst: Endpoint) -> Self {
        Self {
            src,
            edge: edge.into(),
            dst,
        }
    }
}
