//! CLI command definitions and handlers

mod export;
mod import;
mod ingest;
mod schema;
mod stats;
mod synth;
pub mod triples;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_project_config, ProjectConfig};
use crate::graph::GraphStore;
use crate::schema::SchemaRegistry;

/// relgraph - incremental knowledge graph construction
#[derive(Parser, Debug)]
#[command(name = "relgraph")]
#[command(
    version,
    about = "Accumulate extracted relation triples into a typed, weighted knowledge graph",
    after_help = "\
Examples:
  relgraph ingest model.tsv                  Ingest one triples file (scope = file stem)
  relgraph ingest a.tsv b.tsv --scope run1   Ingest several files under one scope
  relgraph export -o graph.json              Write the graph document
  relgraph import other.json                 Merge another graph into this one
  relgraph synth --vertices 10 --edges 15    Ingest a synthetic fixture
  relgraph stats                             Vertex and edge counts by type"
)]
pub struct Cli {
    /// Project root holding relgraph.toml (default: current directory)
    #[arg(long, short = 'C', global = true, default_value = ".")]
    pub path: PathBuf,

    /// Graph database directory (overrides [store] path)
    #[arg(long, global = true, env = "RELGRAPH_STORE")]
    pub store: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest tab-separated triples files into the graph
    ///
    /// Each line is `src_name<TAB>src_type<TAB>edge_type<TAB>dst_name<TAB>dst_type`,
    /// optionally followed by JSON metadata objects for the source and destination.
    /// Lines starting with `#` are comments; `@scope NAME` starts a new pass.
    Ingest {
        /// Triples files, ingested in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Scope for passes without an `@scope` line (default: file stem)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Merge a graph document (JSON) into the graph
    Import {
        /// Graph document produced by `relgraph export`
        file: PathBuf,
    },

    /// Write the graph as a JSON document
    Export {
        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show vertex and edge counts by type
    Stats {
        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Generate a synthetic fixture and ingest it
    Synth {
        /// Number of vertices to generate (default: 10)
        #[arg(long)]
        vertices: Option<usize>,

        /// Number of distinct edges to generate among them (default: 15)
        #[arg(long)]
        edges: Option<usize>,

        /// Vertex type of the generated vertices (default: Concept)
        #[arg(long)]
        kind: Option<String>,

        /// Edge type of the generated edges (default: cooccur)
        #[arg(long)]
        edge_kind: Option<String>,

        /// RNG seed (default: [synth] seed, or 42)
        #[arg(long)]
        seed: Option<u64>,

        /// TOML definitions file (overrides the counts and types above).
        /// Without it, any of the flags above take precedence over `[synth] defs`.
        #[arg(long)]
        defs: Option<PathBuf>,
    },

    /// List the registered vertex and edge types
    Schema,
}

/// Resolved project settings shared by every command
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub registry: Arc<SchemaRegistry>,
    pub store_path: PathBuf,
}

impl Project {
    fn load(root: &Path, store_override: Option<&Path>) -> Result<Self> {
        let config = load_project_config(root);
        let registry = config
            .registry(root)
            .context("Failed to load schema definition")?;
        let store_path = match store_override {
            Some(path) => path.to_path_buf(),
            None => config.store_path(root),
        };
        Ok(Self {
            root: root.to_path_buf(),
            config,
            registry: Arc::new(registry),
            store_path,
        })
    }

    pub fn open_store(&self) -> Result<GraphStore> {
        GraphStore::open(&self.store_path, Arc::clone(&self.registry)).with_context(|| {
            format!(
                "Failed to open graph database at {}",
                self.store_path.display()
            )
        })
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let project = Project::load(&cli.path, cli.store.as_deref())?;

    match cli.command {
        Commands::Ingest { files, scope } => ingest::run(&project, &files, scope.as_deref()),
        Commands::Import { file } => import::run(&project, &file),
        Commands::Export { output } => export::run(&project, output.as_deref()),
        Commands::Stats { format } => stats::run(&project, &format),
        Commands::Synth {
            vertices,
            edges,
            kind,
            edge_kind,
            seed,
            defs,
        } => synth::run(
            &project,
            synth::SynthArgs {
                vertices,
                edges,
                kind,
                edge_kind,
                seed,
                defs,
            },
        ),
        Commands::Schema => schema::run(&project),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from(["relgraph", "ingest", "a.tsv", "b.tsv", "--scope", "run1"])
            .unwrap();
        match cli.command {
            Commands::Ingest { files, scope } => {
                assert_eq!(files.len(), 2);
                assert_eq!(scope.as_deref(), Some("run1"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["relgraph", "ingest"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "relgraph",
            "stats",
            "--log-level",
            "debug",
            "-C",
            "/tmp/project",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.path, PathBuf::from("/tmp/project"));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["relgraph", "stats", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_synth_defaults() {
        let cli = Cli::try_parse_from(["relgraph", "synth"]).unwrap();
        match cli.command {
            Commands::Synth {
                vertices,
                edges,
                kind,
                edge_kind,
                seed,
                defs,
            } => {
                assert_eq!((vertices, edges), (None, None));
                assert!(kind.is_none());
                assert!(edge_kind.is_none());
                assert!(seed.is_none());
                assert!(defs.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
