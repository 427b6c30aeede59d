//! Synth command - generate a synthetic fixture and ingest it

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;
use tracing::warn;

use super::ingest::print_summary;
use super::Project;
use crate::pipeline::Pipeline;
use crate::synth::{SynthDefs, SynthFixture};

const DEFAULT_VERTICES: usize = 10;
const DEFAULT_EDGES: usize = 15;
const DEFAULT_VERTEX_KIND: &str = "Concept";
const DEFAULT_EDGE_KIND: &str = "cooccur";

#[derive(Debug, Default)]
pub struct SynthArgs {
    pub vertices: Option<usize>,
    pub edges: Option<usize>,
    pub kind: Option<String>,
    pub edge_kind: Option<String>,
    pub seed: Option<u64>,
    pub defs: Option<PathBuf>,
}

impl SynthArgs {
    /// Whether any of the homogeneous count or type flags was given
    fn has_shape_flags(&self) -> bool {
        self.vertices.is_some()
            || self.edges.is_some()
            || self.kind.is_some()
            || self.edge_kind.is_some()
    }
}

/// Run the synth command
pub fn run(project: &Project, args: SynthArgs) -> Result<()> {
    let defs = resolve_defs(project, &args)?;
    let seed = args.seed.unwrap_or_else(|| project.config.synth_seed());

    let fixture = SynthFixture::generate(seed, &defs)?;
    let pipeline = Pipeline::new(project.open_store()?);
    let (vertices, edges) = fixture.load_into(&pipeline, &format!("synthetic-{seed}"));
    print_summary(&vertices);
    print_summary(&edges);

    pipeline.graph().save()?;
    println!(
        "\n{} Synthetic fixture (seed {}) ingested: {} vertices, {} edges in graph",
        style("[OK]").green(),
        seed,
        style(pipeline.graph().vertex_count()).cyan(),
        style(pipeline.graph().edge_count()).cyan()
    );
    Ok(())
}

/// Pick the definitions: `--defs` file, then explicit flags, then
/// `[synth] defs`, then the homogeneous defaults.
fn resolve_defs(project: &Project, args: &SynthArgs) -> Result<SynthDefs> {
    if let Some(path) = &args.defs {
        if args.has_shape_flags() {
            warn!(
                "--defs {} given; ignoring --vertices/--edges/--kind/--edge-kind",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(SynthDefs::from_toml_str(&content)?);
    }

    if !args.has_shape_flags() {
        if let Some(defs) = project.config.synth_defs(&project.root)? {
            return Ok(defs);
        }
    }

    Ok(SynthDefs::homogeneous(
        project
            .registry
            .vertex_type(args.kind.as_deref().unwrap_or(DEFAULT_VERTEX_KIND))?,
        args.vertices.unwrap_or(DEFAULT_VERTICES),
        project
            .registry
            .edge_type(args.edge_kind.as_deref().unwrap_or(DEFAULT_EDGE_KIND))?,
        args.edges.unwrap_or(DEFAULT_EDGES),
    ))
}
