//! Tab-separated triples file reader
//!
//! ```text
//! # comment
//! @scope ScalingModel
//! ScalingModel	Module	has	micro_1(du, u, parms, time)	Func
//! parms	Var	comp	β	Var	{"line": 4}	{"occurrences": 1}
//! ```
//!
//! Columns six and seven are optional JSON objects holding source and
//! destination metadata. Names may contain spaces and commas but not tabs.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::graph::Metadata;
use crate::pipeline::{Endpoint, Triple};

/// One `ingest` call worth of triples
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub scope: String,
    pub triples: Vec<Triple>,
}

/// Read a triples file; passes without an `@scope` line use `default_scope`,
/// or the file stem when that is `None`.
pub fn read_triples_file(path: &Path, default_scope: Option<&str>) -> Result<Vec<Pass>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string());
    parse_triples(&content, default_scope.unwrap_or(&stem))
        .with_context(|| format!("Invalid triples file {}", path.display()))
}

/// Parse triples text into passes; empty passes are dropped.
pub fn parse_triples(content: &str, default_scope: &str) -> Result<Vec<Pass>> {
    let mut passes = Vec::new();
    let mut current = Pass {
        scope: default_scope.to_string(),
        triples: Vec::new(),
    };

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if let Some(scope) = line.trim_start().strip_prefix("@scope") {
            let scope = scope.trim();
            if scope.is_empty() {
                bail!("line {}: @scope needs a name", lineno + 1);
            }
            let finished = std::mem::replace(
                &mut current,
                Pass {
                    scope: scope.to_string(),
                    triples: Vec::new(),
                },
            );
            if !finished.triples.is_empty() {
                passes.push(finished);
            }
            continue;
        }

        current.triples.push(
            parse_line(line).with_context(|| format!("line {}", lineno + 1))?,
        );
    }

    if !current.triples.is_empty() {
        passes.push(current);
    }
    Ok(passes)
}

fn parse_line(line: &str) -> Result<Triple> {
    let fields: Vec<&str> = line.split('\t').collect();
    if !(5..=7).contains(&fields.len()) {
        bail!(
            "expected 5 tab-separated fields (plus optional metadata), found {}",
            fields.len()
        );
    }
    if fields[0].is_empty() || fields[3].is_empty() {
        bail!("vertex names must not be empty");
    }

    let mut src = Endpoint::new(fields[0], fields[1].trim());
    let mut dst = Endpoint::new(fields[3], fields[4].trim());
    if let Some(json) = fields.get(5) {
        src.metadata = parse_metadata(json).context("source metadata")?;
    }
    if let Some(json) = fields.get(6) {
        dst.metadata = parse_metadata(json).context("destination metadata")?;
    }
    Ok(Triple::from_endpoints(src, fields[2].trim(), dst))
}

fn parse_metadata(json: &str) -> Result<Metadata> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(Metadata::new());
    }
    Ok(serde_json::from_str(json)?)
}
