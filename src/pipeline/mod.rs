//! Triple ingestion pipeline
//!
//! Feeds one extraction pass ("scope") into the graph store:
//! 1. Check every triple against the schema registry
//! 2. Insert or match the source vertex
//! 3. Insert or match the destination vertex
//! 4. Insert the edge, or increment its weight
//! 5. Record what happened in the pass summary
//!
//! Triples are applied strictly in order, since later triples may refer to
//! vertices created by earlier ones. A triple that fails validation is skipped
//! and the rest of the pass continues; nothing it names is inserted.

mod summary;
mod triple;

pub use summary::{AuditRecord, PassSummary, Violation};
pub use triple::{Endpoint, Triple};

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{GraphError, SchemaViolation};
use crate::graph::{EntityResolver, ExactResolver, GraphStore, Metadata, VertexKey};
use crate::schema::{EdgeKind, SchemaRegistry, VertexKind};

/// Endpoint whose type tag and metadata passed the schema checks
struct CheckedEndpoint<'a> {
    key: VertexKey,
    metadata: &'a Metadata,
}

struct CheckedTriple<'a> {
    src: CheckedEndpoint<'a>,
    edge: EdgeKind,
    dst: CheckedEndpoint<'a>,
}

/// Ingestion pipeline over a long-lived graph store.
pub struct Pipeline<R = ExactResolver> {
    graph: GraphStore,
    resolver: R,
}

impl Pipeline<ExactResolver> {
    /// Create a new pipeline with exact `(name, type)` identity.
    pub fn new(graph: GraphStore) -> Self {
        Self::with_resolver(graph, ExactResolver)
    }
}

impl<R: EntityResolver> Pipeline<R> {
    pub fn with_resolver(graph: GraphStore, resolver: R) -> Self {
        Self { graph, resolver }
    }

    /// Get a reference to the graph store.
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn into_graph(self) -> GraphStore {
        self.graph
    }

    /// Ingest one pass of triples.
    ///
    /// # Arguments
    /// * `scope` - Label of the extraction pass (module, function signature, file)
    /// * `triples` - Observations in extraction order
    pub fn ingest(&self, scope: &str, triples: &[Triple]) -> PassSummary {
        let mut summary = PassSummary::new(scope);
        summary.vertices_before = self.graph.vertex_count();
        summary.edges_before = self.graph.edge_count();

        let checked: Vec<Result<CheckedTriple<'_>, SchemaViolation>> =
            triples.iter().map(|t| self.check_triple(t)).collect();

        let referenced: HashSet<VertexKey> = checked
            .iter()
            .flatten()
            .flat_map(|t| [t.src.key.clone(), t.dst.key.clone()])
            .collect();
        summary.overlap = self.graph.overlap(&referenced);
        info!(
            "Scope '{}': graph contains {} unique vertices, triples refer to {} unique vertices, intersection size {}",
            scope,
            summary.overlap.graph_vertices,
            summary.overlap.referenced_vertices,
            summary.overlap.shared_vertices
        );

        for (index, result) in checked.into_iter().enumerate() {
            let triple = match result {
                Ok(triple) => triple,
                Err(violation) => {
                    warn!("Skipping triple #{} in scope '{}': {}", index, scope, violation);
                    summary.violations.push(Violation {
                        index,
                        error: violation.into(),
                    });
                    continue;
                }
            };

            let (src, src_outcome) = self
                .graph
                .insert_vertex_keyed(triple.src.key, triple.src.metadata.clone());
            let (dst, dst_outcome) = self
                .graph
                .insert_vertex_keyed(triple.dst.key, triple.dst.metadata.clone());
            summary.record_vertex(src_outcome);
            summary.record_vertex(dst_outcome);

            match self.graph.insert_edge(&src.key, triple.edge, &dst.key) {
                Ok((edge, edge_outcome)) => {
                    summary.record_edge(edge_outcome);
                    let record = AuditRecord {
                        index,
                        src: src.key,
                        edge: triple.edge,
                        dst: dst.key,
                        src_outcome,
                        dst_outcome,
                        edge_outcome,
                        weight: edge.weight,
                    };
                    debug!("{}", record);
                    summary.audit.push(record);
                    summary.record_accepted();
                }
                Err(e) => {
                    warn!("Skipping triple #{} in scope '{}': {}", index, scope, e);
                    summary.violations.push(Violation { index, error: e });
                }
            }
        }

        self.finish(&mut summary);
        summary
    }

    /// Ingest standalone vertices (a vertex table) with the same per-record
    /// isolation as [`Pipeline::ingest`].
    pub fn ingest_vertices(&self, scope: &str, vertices: &[Endpoint]) -> PassSummary {
        let mut summary = PassSummary::new(scope);
        summary.vertices_before = self.graph.vertex_count();
        summary.edges_before = self.graph.edge_count();

        for (index, endpoint) in vertices.iter().enumerate() {
            match self.check_endpoint(endpoint) {
                Ok(checked) => {
                    let (_, outcome) = self
                        .graph
                        .insert_vertex_keyed(checked.key, checked.metadata.clone());
                    summary.record_vertex(outcome);
                    summary.record_accepted();
                }
                Err(violation) => {
                    warn!("Skipping vertex #{} in scope '{}': {}", index, scope, violation);
                    summary.violations.push(Violation {
                        index,
                        error: GraphError::from(violation),
                    });
                }
            }
        }

        self.finish(&mut summary);
        summary
    }

    fn finish(&self, summary: &mut PassSummary) {
        summary.vertices_after = self.graph.vertex_count();
        summary.edges_after = self.graph.edge_count();
        info!("Scope '{}': {}", summary.scope, summary.summary());
    }

    fn check_triple<'a>(&self, triple: &'a Triple) -> Result<CheckedTriple<'a>, SchemaViolation> {
        let src = self.check_endpoint(&triple.src)?;
        let edge = self.registry().edge_type(&triple.edge)?;
        let dst = self.check_endpoint(&triple.dst)?;
        Ok(CheckedTriple { src, edge, dst })
    }

    fn check_endpoint<'a>(
        &self,
        endpoint: &'a Endpoint,
    ) -> Result<CheckedEndpoint<'a>, SchemaViolation> {
        let kind: VertexKind = self.registry().vertex_type(&endpoint.kind)?;
        self.registry().check_metadata(kind, &endpoint.metadata)?;
        Ok(CheckedEndpoint {
            key: self.resolver.resolve(&endpoint.name, kind),
            metadata: &endpoint.metadata,
        })
    }

    fn registry(&self) -> &SchemaRegistry {
        self.graph.registry()
    }
}
