use std::fmt;

use crate::error::GraphError;
use crate::graph::{OverlapReport, Outcome, VertexKey};
use crate::schema::EdgeKind;

/// What one triple did to the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Position of the triple in the pass
    pub index: usize,
    pub src: VertexKey,
    pub edge: EdgeKind,
    pub dst: VertexKey,
    pub src_outcome: Outcome,
    pub dst_outcome: Outcome,
    pub edge_outcome: Outcome,
    /// Edge weight after this observation
    pub weight: u64,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}) -{}-> {} ({}): edge {}, weight {}",
            self.index,
            self.src,
            self.src_outcome,
            self.edge,
            self.dst,
            self.dst_outcome,
            self.edge_outcome,
            self.weight
        )
    }
}

/// A record skipped during a pass
#[derive(Debug)]
pub struct Violation {
    pub index: usize,
    pub error: GraphError,
}

/// Outcome of one ingestion pass
#[derive(Debug, Default)]
pub struct PassSummary {
    pub scope: String,
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub edges_before: usize,
    pub edges_after: usize,
    pub vertices_created: usize,
    pub vertices_matched: usize,
    pub edges_created: usize,
    pub edges_incremented: usize,
    pub violations: Vec<Violation>,
    pub audit: Vec<AuditRecord>,
    pub overlap: OverlapReport,
    /// Records applied without a violation
    accepted: usize,
}

impl PassSummary {
    pub(crate) fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn record_vertex(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.vertices_created += 1,
            Outcome::Matched => self.vertices_matched += 1,
        }
    }

    pub(crate) fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    pub(crate) fn record_edge(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.edges_created += 1,
            Outcome::Matched => self.edges_incremented += 1,
        }
    }

    /// Records applied without a violation
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("vertices {} -> {}", self.vertices_before, self.vertices_after),
            format!("edges {} -> {}", self.edges_before, self.edges_after),
            format!(
                "{} new / {} matched vertices",
                self.vertices_created, self.vertices_matched
            ),
            format!(
                "{} new / {} incremented edges",
                self.edges_created, self.edges_incremented
            ),
        ];

        if !self.violations.is_empty() {
            parts.push(format!("{} skipped", self.violations.len()));
        }

        parts.join(", ")
    }
}
