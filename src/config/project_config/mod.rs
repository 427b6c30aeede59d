//! Project-level configuration support
//!
//! Loads per-project configuration from `relgraph.toml` or `.relgraphrc.json`
//! in the project root. Every section is optional.
//!
//! # Configuration Format
//!
//! ```toml
//! # relgraph.toml
//!
//! [schema]
//! path = "schema.toml"            # TOML schema definition
//! # or the two tables:
//! # vertex_table = "vertex_types.csv"
//! # edge_table = "edge_types.csv"
//!
//! [store]
//! path = ".relgraph"              # directory holding graph.redb
//!
//! [synth]
//! seed = 42
//! defs = "synthetic.toml"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::schema::SchemaRegistry;
use crate::synth::SynthDefs;

/// Graph database directory used when `[store] path` is not set
pub const DEFAULT_STORE_DIR: &str = ".relgraph";

/// Seed used when neither the command line nor `[synth] seed` gives one
pub const DEFAULT_SYNTH_SEED: u64 = 42;

/// Project-level configuration loaded from relgraph.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub synth: SynthConfig,
}

/// Where the schema definition comes from (built-in if unset)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SchemaConfig {
    /// TOML schema file
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Vertex type table (`type_name,description,allowed_metadata_fields`)
    #[serde(default)]
    pub vertex_table: Option<PathBuf>,

    /// Edge type table, same columns
    #[serde(default)]
    pub edge_table: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SynthConfig {
    #[serde(default)]
    pub seed: Option<u64>,

    /// TOML file of vertex and edge type definitions for `relgraph synth`
    #[serde(default)]
    pub defs: Option<PathBuf>,
}

/// Load project configuration from the project root
///
/// Searches for config files in order:
/// 1. relgraph.toml
/// 2. .relgraphrc.json
///
/// Returns default config if no file found or on parse error.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    // Try TOML first (preferred format)
    let toml_path = root.join("relgraph.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    // Try JSON
    let json_path = root.join(".relgraphrc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    // No config found, return defaults
    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}

impl ProjectConfig {
    /// Build the schema registry this project declares.
    ///
    /// Unlike the config file itself, a configured schema that fails to load
    /// is an error: ingesting against the wrong schema would silently drop
    /// triples.
    pub fn registry(&self, root: &Path) -> Result<SchemaRegistry> {
        let schema = &self.schema;
        match (&schema.path, &schema.vertex_table, &schema.edge_table) {
            (Some(path), None, None) => SchemaRegistry::load(&resolve(root, path)),
            (None, Some(vertices), Some(edges)) => {
                SchemaRegistry::load_tables(&resolve(root, vertices), &resolve(root, edges))
            }
            (None, None, None) => {
                debug!("Using built-in schema");
                Ok(SchemaRegistry::builtin())
            }
            (Some(_), _, _) => {
                anyhow::bail!("[schema] sets both `path` and a type table; choose one")
            }
            _ => anyhow::bail!("[schema] needs both `vertex_table` and `edge_table`"),
        }
    }

    /// Directory of the persistent graph database
    pub fn store_path(&self, root: &Path) -> PathBuf {
        match &self.store.path {
            Some(path) => resolve(root, path),
            None => root.join(DEFAULT_STORE_DIR),
        }
    }

    pub fn synth_seed(&self) -> u64 {
        self.synth.seed.unwrap_or(DEFAULT_SYNTH_SEED)
    }

    /// Synthetic definitions from `[synth] defs`, if configured
    pub fn synth_defs(&self, root: &Path) -> Result<Option<SynthDefs>> {
        let Some(path) = &self.synth.defs else {
            return Ok(None);
        };
        let path = resolve(root, path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let defs = SynthDefs::from_toml_str(&content)
            .with_context(|| format!("Invalid synthetic definitions in {}", path.display()))?;
        Ok(Some(defs))
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
