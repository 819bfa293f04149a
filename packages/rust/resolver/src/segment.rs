//! Ancestor classification: find the instance and experiment directories of a run path.
//!
//! Walks upward from the immediate parent of the leaf. The first segment the
//! classifier recognises is the instance; above it, structural markers are
//! skipped and the next named segment is the experiment. Nothing above the
//! experiment is looked at.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use benchtree_shared::{BenchTreeError, DEFAULT_STRUCTURAL_MARKERS, Result};
use tracing::trace;

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Where a run path sits in the experiment → instance hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Experiment display name.
    pub experiment: String,
    /// Ancestor directory that named the experiment.
    pub experiment_path: PathBuf,
    /// Canonical instance identifier.
    pub instance: String,
    /// Ancestor directory that named the instance.
    pub instance_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Structural markers
// ---------------------------------------------------------------------------

/// Directory names that group results without identifying anything.
#[derive(Debug, Clone)]
pub struct StructuralMarkers {
    names: Vec<String>,
}

impl StructuralMarkers {
    /// Build a marker set; names are matched case-insensitively.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// True if `segment` is one of the markers, ignoring case.
    pub fn contains(&self, segment: &str) -> bool {
        let lowered = segment.to_lowercase();
        self.names.iter().any(|n| *n == lowered)
    }
}

impl Default for StructuralMarkers {
    fn default() -> Self {
        Self::from_names(DEFAULT_STRUCTURAL_MARKERS)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Normalize a directory name; `None` means the segment cannot name anything.
pub fn normalize_segment(name: &OsStr) -> Option<String> {
    let lossy = name.to_string_lossy();
    let trimmed = lossy.trim();
    match trimmed {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}

/// Classify the ancestors of `path` into a [`Placement`].
///
/// Pure: reads only the components of `path`. Fails with
/// [`BenchTreeError::Classification`] when no instance or no experiment
/// segment is found before the ancestors run out.
pub fn classify_ancestors<C>(
    path: &Path,
    classifier: &C,
    markers: &StructuralMarkers,
) -> Result<Placement>
where
    C: Fn(&str) -> Option<String> + ?Sized,
{
    let mut named = path.ancestors().skip(1).filter_map(|ancestor| {
        let segment = ancestor.file_name().and_then(normalize_segment);
        if segment.is_none() {
            trace!(ancestor = %ancestor.display(), "skipping unnameable segment");
        }
        segment.map(|s| (s, ancestor))
    });

    let (instance, instance_path) = named
        .by_ref()
        .find_map(|(segment, ancestor)| match classifier(&segment) {
            Some(name) if !name.is_empty() => {
                trace!(%segment, instance = %name, "instance segment");
                Some((name, ancestor))
            }
            _ => {
                trace!(%segment, "not an instance");
                None
            }
        })
        .ok_or_else(|| {
            BenchTreeError::classification(path, "no ancestor directory names an instance")
        })?;

    let (experiment, experiment_path) = named
        .find(|(segment, _)| {
            let marker = markers.contains(segment);
            if marker {
                trace!(%segment, "skipping structural marker");
            }
            !marker
        })
        .ok_or_else(|| {
            BenchTreeError::classification(path, "no experiment directory above the instance")
        })?;

    Ok(Placement {
        experiment,
        experiment_path: experiment_path.to_path_buf(),
        instance,
        instance_path: instance_path.to_path_buf(),
    })
}
