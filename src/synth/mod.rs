//! Synthetic fixture generation
//!
//! Produces self-consistent vertex and edge fixtures from declarative type
//! definitions so the graph store can be exercised without a real extractor.
//! Every generated edge refers only to vertices in the supplied pool, and
//! names are unique within a type unless a definition asks for duplicates.
//!
//! Generation is deterministic for a given seed.
//!
//! ```toml
//! [[vertex_types]]
//! kind = "Concept"
//! count = 10
//! tag = "paper"
//!
//! [[edge_types]]
//! kind = "cooccur"
//! src = "Concept"
//! dst = "Concept"
//! count = 15
//! ```

use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::graph::{EntityResolver, VertexKey};
use crate::pipeline::{Endpoint, PassSummary, Pipeline, Triple};
use crate::schema::{EdgeKind, VertexKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("no {kind} vertices in the pool for '{edge}' edges")]
    EmptyPool { edge: EdgeKind, kind: VertexKind },

    #[error("requested {requested} '{edge}' edges but only {available} distinct pairs exist")]
    TooManyEdges {
        edge: EdgeKind,
        requested: usize,
        available: usize,
    },

    #[error("invalid synthetic definition: {0}")]
    InvalidDefinition(String),
}

/// How many vertices of one type to generate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VertexTypeDef {
    pub kind: VertexKind,
    pub count: usize,
    /// Optional label embedded in generated names
    #[serde(default)]
    pub tag: String,
    /// Extra copies of already generated names, to exercise deduplication
    #[serde(default)]
    pub duplicates: usize,
}

/// How many edges of one type to generate between two vertex types
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EdgeTypeDef {
    pub kind: EdgeKind,
    pub src: VertexKind,
    pub dst: VertexKind,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SynthDefs {
    #[serde(default)]
    pub vertex_types: Vec<VertexTypeDef>,
    #[serde(default)]
    pub edge_types: Vec<EdgeTypeDef>,
}

impl SynthDefs {
    /// One vertex type with edges of one type among its own vertices
    pub fn homogeneous(kind: VertexKind, vertices: usize, edge: EdgeKind, edges: usize) -> Self {
        Self {
            vertex_types: vec![VertexTypeDef {
                kind,
                count: vertices,
                tag: String::new(),
                duplicates: 0,
            }],
            edge_types: vec![EdgeTypeDef {
                kind: edge,
                src: kind,
                dst: kind,
                count: edges,
            }],
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SynthError> {
        toml::from_str(content).map_err(|e| SynthError::InvalidDefinition(e.to_string()))
    }
}

/// Seeded generator of vertex names and edge triples
pub struct SyntheticGenerator {
    rng: ChaCha8Rng,
    /// Next index per vertex type, so names stay unique across calls
    next_index: HashMap<VertexKind, usize>,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_index: HashMap::new(),
        }
    }

    /// Generate `(name, type)` keys for every definition.
    ///
    /// Duplicates follow the unique names of their definition.
    pub fn generate_vertices(&mut self, defs: &[VertexTypeDef]) -> Vec<VertexKey> {
        let mut vertices = Vec::new();
        for def in defs {
            let start = vertices.len();
            for _ in 0..def.count {
                let name = self.vertex_name(def.kind, &def.tag);
                vertices.push(VertexKey::new(name, def.kind));
            }

            if def.count > 0 {
                for _ in 0..def.duplicates {
                    let pick = self.rng.random_range(start..start + def.count);
                    vertices.push(vertices[pick].clone());
                }
            }
            debug!(
                "Generated {} {} vertices ({} duplicates)",
                def.count, def.kind, def.duplicates
            );
        }
        vertices
    }

    /// Generate distinct `(src, type, dst)` triples over `pool`.
    ///
    /// Distinctness holds across all definitions, so two definitions of the
    /// same edge type between the same vertex types share one pair space.
    /// Self-loops are never generated; repeated pool entries count once.
    pub fn generate_edges(
        &mut self,
        defs: &[EdgeTypeDef],
        pool: &[VertexKey],
    ) -> Result<Vec<Triple>, SynthError> {
        let unique = dedup_pool(pool);
        let mut used: UsedEdges<'_> = HashSet::new();
        let mut triples = Vec::new();

        for def in defs {
            if def.count == 0 {
                continue;
            }
            let sources: Vec<&VertexKey> =
                unique.iter().copied().filter(|k| k.kind == def.src).collect();
            let targets: Vec<&VertexKey> =
                unique.iter().copied().filter(|k| k.kind == def.dst).collect();
            if sources.is_empty() {
                return Err(SynthError::EmptyPool {
                    edge: def.kind,
                    kind: def.src,
                });
            }
            if targets.is_empty() {
                return Err(SynthError::EmptyPool {
                    edge: def.kind,
                    kind: def.dst,
                });
            }

            // Same-kind pools lose the n diagonal pairs to the no-self-loop rule
            let mut available = sources.len() * targets.len();
            if def.src == def.dst {
                available -= sources.len();
            }
            available -= used
                .iter()
                .filter(|(src, kind, dst)| {
                    *kind == def.kind && src.kind == def.src && dst.kind == def.dst
                })
                .count();
            if def.count > available {
                return Err(SynthError::TooManyEdges {
                    edge: def.kind,
                    requested: def.count,
                    available,
                });
            }

            let pairs = if def.count * 2 <= available {
                self.sample_pairs(&sources, &targets, def.kind, def.count, &mut used)
            } else {
                self.shuffle_pairs(&sources, &targets, def.kind, def.count, &mut used)
            };
            triples.extend(pairs.into_iter().map(|(src, dst)| {
                Triple::new(
                    src.name.clone(),
                    src.kind.as_str(),
                    def.kind.as_str(),
                    dst.name.clone(),
                    dst.kind.as_str(),
                )
            }));
            debug!("Generated {} {} edges", def.count, def.kind);
        }

        Ok(triples)
    }

    fn vertex_name(&mut self, kind: VertexKind, tag: &str) -> String {
        let index = self.next_index.entry(kind).or_insert(0);
        let current = *index;
        *index += 1;

        let suffix: u32 = self.rng.random();
        if tag.is_empty() {
            format!("{}_{}_{:08x}", kind, current, suffix)
        } else {
            format!("{}_{}_{}_{:08x}", kind, tag, current, suffix)
        }
    }

    /// Rejection sampling for sparse requests
    fn sample_pairs<'a>(
        &mut self,
        sources: &[&'a VertexKey],
        targets: &[&'a VertexKey],
        kind: EdgeKind,
        count: usize,
        used: &mut UsedEdges<'a>,
    ) -> Vec<(&'a VertexKey, &'a VertexKey)> {
        let mut pairs = Vec::with_capacity(count);
        while pairs.len() < count {
            let (Some(&src), Some(&dst)) =
                (sources.choose(&mut self.rng), targets.choose(&mut self.rng))
            else {
                break;
            };
            if src != dst && used.insert((src, kind, dst)) {
                pairs.push((src, dst));
            }
        }
        pairs
    }

    /// Full enumeration of the unused pairs for dense requests
    fn shuffle_pairs<'a>(
        &mut self,
        sources: &[&'a VertexKey],
        targets: &[&'a VertexKey],
        kind: EdgeKind,
        count: usize,
        used: &mut UsedEdges<'a>,
    ) -> Vec<(&'a VertexKey, &'a VertexKey)> {
        let mut pairs: Vec<(&VertexKey, &VertexKey)> = sources
            .iter()
            .flat_map(|&src| targets.iter().map(move |&dst| (src, dst)))
            .filter(|&(src, dst)| src != dst && !used.contains(&(src, kind, dst)))
            .collect();
        pairs.shuffle(&mut self.rng);
        pairs.truncate(count);
        used.extend(pairs.iter().map(|&(src, dst)| (src, kind, dst)));
        pairs
    }
}

/// Edges already generated in one `generate_edges` call
type UsedEdges<'a> = HashSet<(&'a VertexKey, EdgeKind, &'a VertexKey)>;

fn dedup_pool(pool: &[VertexKey]) -> Vec<&VertexKey> {
    let mut seen = HashSet::with_capacity(pool.len());
    pool.iter().filter(|k| seen.insert(*k)).collect()
}

/// A generated vertex pool and the triples over it
#[derive(Debug, Clone)]
pub struct SynthFixture {
    pub vertices: Vec<VertexKey>,
    pub triples: Vec<Triple>,
}

impl SynthFixture {
    pub fn generate(seed: u64, defs: &SynthDefs) -> Result<Self, SynthError> {
        let mut generator = SyntheticGenerator::new(seed);
        let vertices = generator.generate_vertices(&defs.vertex_types);
        let triples = generator.generate_edges(&defs.edge_types, &vertices)?;
        Ok(Self { vertices, triples })
    }

    pub fn vertex_endpoints(&self) -> Vec<Endpoint> {
        self.vertices
            .iter()
            .map(|k| Endpoint::new(k.name.clone(), k.kind.as_str()))
            .collect()
    }

    /// Ingest the vertex pool, then the triples, as two passes of `scope`
    pub fn load_into<R: EntityResolver>(
        &self,
        pipeline: &Pipeline<R>,
        scope: &str,
    ) -> (PassSummary, PassSummary) {
        let vertices = pipeline.ingest_vertices(scope, &self.vertex_endpoints());
        let edges = pipeline.ingest(scope, &self.triples);
        (vertices, edges)
    }
}
