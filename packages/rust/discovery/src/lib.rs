//! Run file discovery under a results root.
//!
//! Walks the tree with `walkdir`, keeping regular files whose names match the
//! include patterns and none of the exclude patterns. Entries are sorted by
//! file name inside each directory, so every file of one instance directory
//! is yielded before the walk moves on to a sibling.

use std::path::{Path, PathBuf};

use benchtree_shared::{BenchTreeError, Result, ScanConfig, compile_patterns};
use regex::Regex;
use tracing::{debug, info, instrument, trace, warn};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// FileFilter
// ---------------------------------------------------------------------------

/// Compiled include/exclude file name patterns.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl FileFilter {
    /// Compile the patterns. An empty include list accepts every file.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(include)?,
            exclude: compile_patterns(exclude)?,
        })
    }

    /// True if `file_name` is included and not excluded. Exclude wins.
    pub fn accepts(&self, file_name: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(file_name)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(file_name))
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Find the run files under `root`, in walk order.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover_runs(root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(BenchTreeError::validation(format!(
            "results root {} is not a directory",
            root.display()
        )));
    }

    let filter = FileFilter::new(&config.include_patterns, &config.exclude_patterns)?;

    let mut walker = WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by_file_name();
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                warn!(error = %e, "skipping symlink loop");
                continue;
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk error"));
                return Err(BenchTreeError::io(path, source));
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if filter.accepts(&file_name) {
            trace!(path = %entry.path().display(), "run file");
            paths.push(entry.into_path());
        } else {
            debug!(file = %file_name, "filtered out");
        }
    }

    info!(count = paths.len(), "discovered run files");
    Ok(paths)
}
