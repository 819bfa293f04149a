//! Path-hierarchy resolution for benchtree.
//!
//! Given a stream of run file paths, the [`HierarchyResolver`] recognises the
//! instance and experiment directories among each path's ancestors and keeps
//! the matching builder contexts open while consecutive paths share them:
//!
//! ```text
//! <experiment>/[markers…]/<instance>/[anything…]/<run file>
//! ```
//!
//! The contexts themselves are supplied by the caller through the
//! [`ContextFactory`] traits. Classification is an injected
//! `Fn(&str) -> Option<String>`; [`PatternClassifier`] provides a regex one.

mod classifier;
mod context;
mod resolver;
mod segment;

pub use classifier::PatternClassifier;
pub use context::{ContextFactory, ExperimentContext, InstanceRunsContext, RunOf};
pub use resolver::{HierarchyResolver, ResolverState};
pub use segment::{Placement, StructuralMarkers, classify_ancestors, normalize_segment};
