//! Import command - merge a graph document into the graph

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;

use super::Project;
use crate::graph::GraphStore;

/// Run the import command
pub fn run(project: &Project, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    // A corrupt document fails here, before the store is opened
    let imported = GraphStore::deserialize(&json, Arc::clone(&project.registry))
        .with_context(|| format!("Failed to load graph document {}", file.display()))?;

    let store = project.open_store()?;
    let stats = store.merge_from(&imported);
    store.save()?;

    println!(
        "{} Imported {}: {} new vertices ({} matched), {} new edges ({} incremented)",
        style("[OK]").green(),
        style(file.display()).cyan(),
        stats.vertices_created,
        stats.vertices_matched,
        stats.edges_created,
        stats.edges_incremented
    );
    Ok(())
}
