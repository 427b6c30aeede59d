//! Schema registry for vertex and edge types
//!
//! The registry is the enumerated, data-driven set of legal vertex and edge
//! types, each with a description and the metadata fields a vertex of that
//! type may carry. It is loaded once at startup (built in, from a TOML file,
//! or from two CSV-like tables) and is immutable afterwards; share it behind
//! an `Arc`.
//!
//! # TOML format
//!
//! ```toml
//! [[vertex_types]]
//! name = "Func"
//! description = "Function definition"
//! metadata = ["path", "line", "occurrences"]
//! counters = ["occurrences"]
//!
//! [[edge_types]]
//! name = "takes"
//! description = "Function takes an argument"
//! ```
//!
//! # Table format
//!
//! One row per type: `type_name,description,allowed_metadata_fields`.
//! Fields are separated by `;` and a trailing `+` marks a counter field:
//!
//! ```text
//! type_name,description,allowed_metadata_fields
//! Func,Function definition,path;line;occurrences+
//! ```

mod kinds;

pub use kinds::{EdgeKind, VertexKind};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::SchemaViolation;
use crate::graph::Metadata;

/// One row of the schema: a type with its description and metadata fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Metadata fields a vertex of this type may carry
    #[serde(default)]
    pub metadata: Vec<String>,
    /// Subset of `metadata` that accumulates on duplicate insertion
    #[serde(default)]
    pub counters: Vec<String>,
}

impl TypeDef {
    fn from_row(name: &str, description: &str, fields: &str) -> Self {
        let mut metadata = Vec::new();
        let mut counters = Vec::new();
        for field in fields.split(';').map(str::trim).filter(|f| !f.is_empty()) {
            match field.strip_suffix('+') {
                Some(counter) => {
                    metadata.push(counter.to_string());
                    counters.push(counter.to_string());
                }
                None => metadata.push(field.to_string()),
            }
        }
        Self {
            name: name.to_string(),
            description: description.to_string(),
            metadata,
            counters,
        }
    }

    pub fn allows(&self, field: &str) -> bool {
        self.metadata.iter().any(|f| f == field)
    }

    pub fn is_counter(&self, field: &str) -> bool {
        self.counters.iter().any(|f| f == field)
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    vertex_types: Vec<TypeDef>,
    #[serde(default)]
    edge_types: Vec<TypeDef>,
}

/// Registry of legal vertex and edge types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    vertex_types: BTreeMap<VertexKind, TypeDef>,
    edge_types: BTreeMap<EdgeKind, TypeDef>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    /// Registry with every known vertex and edge type
    pub fn builtin() -> Self {
        let vertex_types = VertexKind::ALL
            .into_iter()
            .map(|kind| {
                let (description, fields) = builtin_vertex_row(kind);
                (kind, TypeDef::from_row(kind.as_str(), description, fields))
            })
            .collect();
        let edge_types = EdgeKind::ALL
            .into_iter()
            .map(|kind| {
                let description = builtin_edge_description(kind);
                (kind, TypeDef::from_row(kind.as_str(), description, ""))
            })
            .collect();
        Self {
            vertex_types,
            edge_types,
        }
    }

    /// Parse a TOML schema definition
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaViolation> {
        let file: SchemaFile = toml::from_str(content)
            .map_err(|e| SchemaViolation::InvalidDefinition(e.to_string()))?;
        Self::from_defs(file.vertex_types, file.edge_types)
    }

    /// Parse the two CSV-like tables (vertex types, edge types)
    pub fn from_tables(vertex_table: &str, edge_table: &str) -> Result<Self, SchemaViolation> {
        Self::from_defs(parse_table(vertex_table)?, parse_table(edge_table)?)
    }

    /// Load a TOML schema file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        let registry = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid schema in {}", path.display()))?;
        debug!(
            "Loaded schema from {} ({} vertex types, {} edge types)",
            path.display(),
            registry.vertex_types.len(),
            registry.edge_types.len()
        );
        Ok(registry)
    }

    /// Load a schema from a vertex-type table file and an edge-type table file
    pub fn load_tables(vertex_path: &Path, edge_path: &Path) -> Result<Self> {
        let vertices = std::fs::read_to_string(vertex_path)
            .with_context(|| format!("Failed to read {}", vertex_path.display()))?;
        let edges = std::fs::read_to_string(edge_path)
            .with_context(|| format!("Failed to read {}", edge_path.display()))?;
        Ok(Self::from_tables(&vertices, &edges)?)
    }

    fn from_defs(
        vertex_defs: Vec<TypeDef>,
        edge_defs: Vec<TypeDef>,
    ) -> Result<Self, SchemaViolation> {
        let mut vertex_types = BTreeMap::new();
        for def in vertex_defs {
            let kind = def.name.parse::<VertexKind>().map_err(invalid)?;
            validate_counters(&def)?;
            if vertex_types.insert(kind, def).is_some() {
                return Err(SchemaViolation::InvalidDefinition(format!(
                    "vertex type '{kind}' declared twice"
                )));
            }
        }

        let mut edge_types = BTreeMap::new();
        for def in edge_defs {
            let kind = def.name.parse::<EdgeKind>().map_err(invalid)?;
            if !def.metadata.is_empty() || !def.counters.is_empty() {
                return Err(SchemaViolation::InvalidDefinition(format!(
                    "edge type '{kind}' declares metadata; edges only carry a weight"
                )));
            }
            if edge_types.insert(kind, def).is_some() {
                return Err(SchemaViolation::InvalidDefinition(format!(
                    "edge type '{kind}' declared twice"
                )));
            }
        }

        Ok(Self {
            vertex_types,
            edge_types,
        })
    }

    pub fn is_valid_vertex_type(&self, name: &str) -> bool {
        self.vertex_type(name).is_ok()
    }

    pub fn is_valid_edge_type(&self, name: &str) -> bool {
        self.edge_type(name).is_ok()
    }

    /// Resolve a vertex type tag, rejecting tags this registry does not declare
    pub fn vertex_type(&self, name: &str) -> Result<VertexKind, SchemaViolation> {
        match name.parse::<VertexKind>() {
            Ok(kind) if self.vertex_types.contains_key(&kind) => Ok(kind),
            _ => Err(SchemaViolation::UnknownVertexType(name.to_string())),
        }
    }

    /// Resolve an edge type tag, rejecting tags this registry does not declare
    pub fn edge_type(&self, name: &str) -> Result<EdgeKind, SchemaViolation> {
        match name.parse::<EdgeKind>() {
            Ok(kind) if self.edge_types.contains_key(&kind) => Ok(kind),
            _ => Err(SchemaViolation::UnknownEdgeType(name.to_string())),
        }
    }

    pub fn has_vertex_kind(&self, kind: VertexKind) -> bool {
        self.vertex_types.contains_key(&kind)
    }

    pub fn has_edge_kind(&self, kind: EdgeKind) -> bool {
        self.edge_types.contains_key(&kind)
    }

    pub fn vertex_def(&self, kind: VertexKind) -> Option<&TypeDef> {
        self.vertex_types.get(&kind)
    }

    /// Check that every metadata field is declared for the vertex type and
    /// that counter fields hold integers
    pub fn check_metadata(
        &self,
        kind: VertexKind,
        metadata: &Metadata,
    ) -> Result<(), SchemaViolation> {
        let def = self
            .vertex_types
            .get(&kind)
            .ok_or_else(|| SchemaViolation::UnknownVertexType(kind.to_string()))?;
        for (field, value) in metadata {
            if !def.allows(field) {
                return Err(SchemaViolation::DisallowedMetadata {
                    vertex_type: kind.to_string(),
                    field: field.clone(),
                });
            }
            if def.is_counter(field) && value.as_i64().is_none() {
                return Err(SchemaViolation::NonIntegerCounter {
                    vertex_type: kind.to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn is_counter(&self, kind: VertexKind, field: &str) -> bool {
        self.vertex_types
            .get(&kind)
            .is_some_and(|def| def.is_counter(field))
    }

    pub fn vertex_types(&self) -> impl Iterator<Item = (VertexKind, &TypeDef)> {
        self.vertex_types.iter().map(|(k, d)| (*k, d))
    }

    pub fn edge_types(&self) -> impl Iterator<Item = (EdgeKind, &TypeDef)> {
        self.edge_types.iter().map(|(k, d)| (*k, d))
    }
}

fn invalid(err: SchemaViolation) -> SchemaViolation {
    SchemaViolation::InvalidDefinition(err.to_string())
}

fn validate_counters(def: &TypeDef) -> Result<(), SchemaViolation> {
    match def.counters.iter().find(|c| !def.allows(c)) {
        Some(counter) => Err(SchemaViolation::InvalidDefinition(format!(
            "counter '{}' of type '{}' is not a declared metadata field",
            counter, def.name
        ))),
        None => Ok(()),
    }
}

/// Parse `type_name,description,allowed_metadata_fields` rows.
///
/// The description may itself contain commas: the name ends at the first
/// comma and the field list starts after the last one.
fn parse_table(table: &str) -> Result<Vec<TypeDef>, SchemaViolation> {
    let mut defs = Vec::new();
    for (lineno, line) in table.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("type_name,") {
            continue;
        }
        let (name, rest) = line.split_once(',').ok_or_else(|| {
            SchemaViolation::InvalidDefinition(format!("line {}: expected 3 columns", lineno + 1))
        })?;
        let (description, fields) = rest.rsplit_once(',').ok_or_else(|| {
            SchemaViolation::InvalidDefinition(format!("line {}: expected 3 columns", lineno + 1))
        })?;
        defs.push(TypeDef::from_row(
            name.trim(),
            description.trim(),
            fields.trim(),
        ));
    }
    Ok(defs)
}

fn builtin_vertex_row(kind: VertexKind) -> (&'static str, &'static str) {
    match kind {
        VertexKind::Module => ("Module or script scope", "path;occurrences+"),
        VertexKind::Func => (
            "Function definition, named by its signature",
            "path;line;occurrences+",
        ),
        VertexKind::Var => ("Variable binding", "path;line;occurrences+"),
        VertexKind::Expr => ("Expression", "path;line;occurrences+"),
        VertexKind::Value => ("Literal value", "occurrences+"),
        VertexKind::Collection => ("Collection literal", "occurrences+"),
        VertexKind::Concept => (
            "Concept extracted from annotated text",
            "source;occurrences+",
        ),
        VertexKind::Document => ("Source document or paper", "path;title"),
    }
}

fn builtin_edge_description(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Takes => "Function takes an argument",
        EdgeKind::Val => "Variable is bound to a value",
        EdgeKind::Output => "Scope assigns a variable",
        EdgeKind::Input => "Scope consumes a call or operator",
        EdgeKind::Args => "Call applied to arguments",
        EdgeKind::Comp => "Component of a collection",
        EdgeKind::Has => "Scope has a member",
        EdgeKind::Destructure => "Tuple destructuring of a value",
        EdgeKind::Property => "Property of a variable",
        EdgeKind::Cooccur => "Co-occurrence in text",
        EdgeKind::Var => "Collection element variable",
        EdgeKind::Exp => "Variable defined by an expression",
        EdgeKind::Implements => "Variable implements a concept",
    }
}
