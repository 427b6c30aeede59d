//! Export command - write the graph document

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::Project;

/// Run the export command
pub fn run(project: &Project, output: Option<&Path>) -> Result<()> {
    let store = project.open_store()?;
    let json = store.serialize()?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} vertices and {} edges to {}",
                style("[OK]").green(),
                store.vertex_count(),
                store.edge_count(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
