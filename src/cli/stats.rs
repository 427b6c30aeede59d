//! Stats command - graph size by type

use anyhow::Result;
use console::style;

use super::Project;

/// Run the stats command
pub fn run(project: &Project, format: &str) -> Result<()> {
    let stats = project.open_store()?.stats();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\nGraph {}\n", style(project.store_path.display()).dim());
    println!(
        "  {} vertices, {} edges, total weight {}",
        style(stats.vertices).cyan(),
        style(stats.edges).cyan(),
        style(stats.total_weight).cyan()
    );

    if !stats.vertices_by_kind.is_empty() {
        println!("\n  Vertices by type");
        for (kind, count) in &stats.vertices_by_kind {
            println!("    {:<12} {}", kind, count);
        }
    }
    if !stats.edges_by_kind.is_empty() {
        println!("\n  Edges by type");
        for (kind, count) in &stats.edges_by_kind {
            println!("    {:<12} {}", kind, count);
        }
    }
    println!();
    Ok(())
}
