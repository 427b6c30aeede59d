//! relgraph - knowledge graph construction CLI
//!
//! Ingests tab-separated relation triples into a persistent, typed, weighted
//! knowledge graph and exports it as a portable JSON document.

use anyhow::Result;
use clap::Parser;
use relgraph::cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI args first so --log-level can seed the filter
    let cli = cli::Cli::parse();

    // Initialize logging (RUST_LOG wins over --log-level)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run(cli)
}
