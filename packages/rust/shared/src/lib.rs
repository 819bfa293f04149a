//! Shared types, error model, and configuration for benchtree.
//!
//! This crate is the foundation depended on by all other benchtree crates.
//! It provides:
//! - [`BenchTreeError`] — the unified error type
//! - Catalog types ([`Catalog`], [`ExperimentRecord`], [`InstanceRecord`], [`RunRecord`])
//! - Configuration ([`AppConfig`], [`ScanConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClassifierConfig, DEFAULT_INSTANCE_PATTERN, DEFAULT_STRUCTURAL_MARKERS,
    OutputConfig, ScanConfig, ScanPoliciesConfig, compile_patterns, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{BenchTreeError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, Catalog, CatalogId, ExperimentRecord, InstanceRecord, RunRecord,
};
