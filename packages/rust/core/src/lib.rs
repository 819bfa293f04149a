//! Pipeline orchestration for benchtree.
//!
//! This crate ties together discovery, hierarchy resolution, and catalog
//! materialization into the end-to-end `scan` workflow.

pub mod pipeline;
