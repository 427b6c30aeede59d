use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaViolation;

/// Vertex types in the knowledge graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexKind {
    /// Module or script-level scope
    Module,
    /// Function definition, usually named by its signature
    Func,
    /// Variable binding
    Var,
    /// Expression appearing on the right of an assignment or as a call
    Expr,
    /// Literal value
    Value,
    /// Tuple, array or other collection literal
    Collection,
    /// Concept extracted from annotated text
    Concept,
    /// Source document or paper
    Document,
}

impl VertexKind {
    pub const ALL: [VertexKind; 8] = [
        VertexKind::Module,
        VertexKind::Func,
        VertexKind::Var,
        VertexKind::Expr,
        VertexKind::Value,
        VertexKind::Collection,
        VertexKind::Concept,
        VertexKind::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VertexKind::Module => "Module",
            VertexKind::Func => "Func",
            VertexKind::Var => "Var",
            VertexKind::Expr => "Expr",
            VertexKind::Value => "Value",
            VertexKind::Collection => "Collection",
            VertexKind::Concept => "Concept",
            VertexKind::Document => "Document",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VertexKind {
    type Err = SchemaViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VertexKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SchemaViolation::UnknownVertexType(s.to_string()))
    }
}

/// Relation types in the knowledge graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Function takes an argument
    Takes,
    /// Variable is bound to a value
    Val,
    /// Scope produces (assigns) a variable
    Output,
    /// Scope consumes a call or operator
    Input,
    /// Call or operator applied to arguments
    Args,
    /// Component of a collection
    Comp,
    /// Scope has a member
    Has,
    /// Tuple destructuring of a value
    Destructure,
    /// Property of a variable (e.g. "collection")
    Property,
    /// Co-occurrence in text
    Cooccur,
    /// Collection element variable
    Var,
    /// Variable defined by an expression
    Exp,
    /// Variable implements a concept
    Implements,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 13] = [
        EdgeKind::Takes,
        EdgeKind::Val,
        EdgeKind::Output,
        EdgeKind::Input,
        EdgeKind::Args,
        EdgeKind::Comp,
        EdgeKind::Has,
        EdgeKind::Destructure,
        EdgeKind::Property,
        EdgeKind::Cooccur,
        EdgeKind::Var,
        EdgeKind::Exp,
        EdgeKind::Implements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Takes => "takes",
            EdgeKind::Val => "val",
            EdgeKind::Output => "output",
            EdgeKind::Input => "input",
            EdgeKind::Args => "args",
            EdgeKind::Comp => "comp",
            EdgeKind::Has => "has",
            EdgeKind::Destructure => "destructure",
            EdgeKind::Property => "property",
            EdgeKind::Cooccur => "cooccur",
            EdgeKind::Var => "var",
            EdgeKind::Exp => "exp",
            EdgeKind::Implements => "implements",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = SchemaViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SchemaViolation::UnknownEdgeType(s.to_string()))
    }
}
