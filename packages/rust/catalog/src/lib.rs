//! Catalog materialization for benchtree.
//!
//! [`CatalogBuilder`] is the context factory the resolver drives; closing the
//! contexts it hands out commits experiment, instance and run records into
//! a [`benchtree_shared::Catalog`]. The `file` module persists catalogs.

mod builder;
mod file;

pub use builder::{CatalogBuilder, ExperimentBuilder, InstanceRunsBuilder, RunBuilder, run_id};
pub use file::{load_catalog, render_tree, write_catalog};
