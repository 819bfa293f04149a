//! Catalog data types: the experiment → instance runs → run hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the catalog format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// CatalogId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for catalog identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub Uuid);

impl CatalogId {
    /// Generate a new time-sortable catalog identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for CatalogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CatalogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The `catalog.json` structure written at the end of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this catalog.
    pub id: CatalogId,
    /// Results root the paths were discovered under.
    pub root: String,
    /// When the catalog was built.
    pub created_at: DateTime<Utc>,
    /// Experiments in the order they were first opened.
    pub experiments: Vec<ExperimentRecord>,
}

impl Catalog {
    /// Total number of runs across all experiments.
    pub fn run_count(&self) -> usize {
        self.experiments.iter().map(ExperimentRecord::run_count).sum()
    }
}

/// One experiment and the instance groups recorded under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Display name, taken from the experiment directory.
    pub name: String,
    /// Instance groups in the order they were opened.
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

impl ExperimentRecord {
    /// Number of runs across all instance groups.
    pub fn run_count(&self) -> usize {
        self.instances.iter().map(|i| i.runs.len()).sum()
    }
}

/// Runs of one problem instance within an experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Canonical instance identifier returned by the classifier.
    pub instance: String,
    /// Runs in call order.
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

/// A single located run result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Stable identifier derived from the source path.
    pub id: String,
    /// Path of the result file relative to the scan root.
    pub source: String,
    /// Leaf file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}
