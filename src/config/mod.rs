//! Configuration module for relgraph
//!
//! This module handles project-level configuration (relgraph.toml): where the
//! schema definition lives, where the graph database is stored, and the
//! defaults of the synthetic generator.

mod project_config;

pub use project_config::{
    load_project_config, ProjectConfig, SchemaConfig, StoreConfig, SynthConfig,
    DEFAULT_STORE_DIR, DEFAULT_SYNTH_SEED,
};
