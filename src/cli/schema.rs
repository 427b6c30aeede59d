//! Schema command - list registered types

use anyhow::Result;
use console::style;

use super::Project;
use crate::schema::TypeDef;

/// Run the schema command
pub fn run(project: &Project) -> Result<()> {
    let registry = &project.registry;

    println!("\n{}\n", style("Vertex types").bold());
    for (kind, def) in registry.vertex_types() {
        println!(
            "  {:<12} {}{}",
            style(kind).cyan(),
            def.description,
            fields_suffix(def)
        );
    }

    println!("\n{}\n", style("Edge types").bold());
    for (kind, def) in registry.edge_types() {
        println!("  {:<12} {}", style(kind).green(), def.description);
    }
    println!();
    Ok(())
}

/// ` [path, occurrences+]`, with `+` marking counters
fn fields_suffix(def: &TypeDef) -> String {
    if def.metadata.is_empty() {
        return String::new();
    }
    let fields: Vec<String> = def
        .metadata
        .iter()
        .map(|f| {
            if def.is_counter(f) {
                format!("{f}+")
            } else {
                f.clone()
            }
        })
        .collect();
    format!(" [{}]", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaRegistry, VertexKind};

    #[test]
    fn test_fields_suffix_marks_counters() {
        let registry = SchemaRegistry::builtin();
        let func = registry.vertex_def(VertexKind::Func).unwrap();
        assert_eq!(fields_suffix(func), " [path, line, occurrences+]");
    }
}
