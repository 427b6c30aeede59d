//! Ingest command - load triples files into the graph

use anyhow::Result;
use console::style;
use std::path::PathBuf;
use tracing::debug;

use super::triples::read_triples_file;
use super::Project;
use crate::pipeline::{PassSummary, Pipeline};

/// Run the ingest command
pub fn run(project: &Project, files: &[PathBuf], scope: Option<&str>) -> Result<()> {
    // Parse everything before touching the store
    let mut passes = Vec::new();
    for file in files {
        let file_passes = read_triples_file(file, scope)?;
        debug!("{}: {} passes", file.display(), file_passes.len());
        passes.extend(file_passes);
    }

    let pipeline = Pipeline::new(project.open_store()?);
    let mut skipped = 0;
    for pass in &passes {
        let summary = pipeline.ingest(&pass.scope, &pass.triples);
        skipped += summary.violations.len();
        print_summary(&summary);
    }

    pipeline.graph().save()?;

    println!(
        "\n{} {} passes ingested into {} ({} vertices, {} edges)",
        style("[OK]").green(),
        passes.len(),
        style(project.store_path.display()).dim(),
        style(pipeline.graph().vertex_count()).cyan(),
        style(pipeline.graph().edge_count()).cyan()
    );
    if skipped > 0 {
        println!(
            "     {} triples skipped (see warnings above)",
            style(skipped).yellow()
        );
    }
    Ok(())
}

/// Print one pass summary with its violations
pub(crate) fn print_summary(summary: &PassSummary) {
    println!("{} {}", style(&summary.scope).cyan().bold(), summary.summary());
    for violation in &summary.violations {
        println!(
            "  {} #{}: {}",
            style("skipped").yellow(),
            violation.index,
            violation.error
        );
    }
}
