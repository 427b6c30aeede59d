//! Entity key resolution
//!
//! A vertex is identified by its literal `(name, type)` pair. Two observations
//! with the same name and type are the same entity, even when they come from
//! unrelated source artifacts. This merges some distinct entities that share
//! a name, and that is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

use crate::schema::VertexKind;

/// Identity key of a vertex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexKey {
    pub kind: VertexKind,
    pub name: String,
}

impl VertexKey {
    pub fn new(name: impl Into<String>, kind: VertexKind) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Stable 64-bit hash of `(type, name)` for display and external tooling.
    ///
    /// Never used for deduplication; key equality is exact.
    pub fn fingerprint(&self) -> u64 {
        let mut bytes = Vec::with_capacity(self.name.len() + 16);
        bytes.extend_from_slice(self.kind.as_str().as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.name.as_bytes());
        xxh3_64(&bytes)
    }
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Exact lexical key for `(name, type)`
pub fn resolve(name: &str, kind: VertexKind) -> VertexKey {
    VertexKey::new(name, kind)
}

/// Maps a candidate vertex to its identity key.
///
/// Implementations must be pure and deterministic: the same `(name, kind)`
/// always yields the same key.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, name: &str, kind: VertexKind) -> VertexKey;
}

/// Exact `(name, type)` matching
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactResolver;

impl EntityResolver for ExactResolver {
    fn resolve(&self, name: &str, kind: VertexKind) -> VertexKey {
        resolve(name, kind)
    }
}
