//! End-to-end `scan` pipeline: results root → discovery → resolve → catalog.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use benchtree_catalog::{CatalogBuilder, write_catalog};
use benchtree_discovery::discover_runs;
use benchtree_resolver::{HierarchyResolver, PatternClassifier, StructuralMarkers};
use benchtree_shared::{CatalogId, Result, ScanConfig};

/// Configuration for the `scan` pipeline.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Results root to walk.
    pub root: PathBuf,
    /// Directory the catalog is written into.
    pub output_dir: PathBuf,
    /// Merged scan settings.
    pub scan: ScanConfig,
}

/// Result of the `scan` pipeline.
#[derive(Debug)]
pub struct ScanResult {
    /// Path of the written catalog file.
    pub catalog_path: PathBuf,
    /// Catalog identifier.
    pub catalog_id: CatalogId,
    /// Number of experiments recorded.
    pub experiments: usize,
    /// Number of instance groups recorded.
    pub instances: usize,
    /// Number of runs recorded.
    pub runs: usize,
    /// Paths skipped because they could not be classified.
    pub skipped: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each run is recorded.
    fn run_recorded(&self, source: &Path, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ScanResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn run_recorded(&self, _source: &Path, _current: usize, _total: usize) {}
    fn done(&self, _result: &ScanResult) {}
}

/// Run the full `scan` pipeline.
///
/// 1. Discover run files under the root
/// 2. Resolve each (relative) path into experiment / instance / run contexts
/// 3. Dispose the resolver, even when resolution failed
/// 4. Write the catalog
#[instrument(skip_all, fields(root = %request.root.display()))]
pub fn scan(request: &ScanRequest, progress: &dyn ProgressReporter) -> Result<ScanResult> {
    let start = Instant::now();

    // --- Phase 1: Discovery ---
    progress.phase("Discovering run files");
    let catalog_path = request.output_dir.join(&request.scan.catalog_file);
    let mut paths = discover_runs(&request.root, &request.scan)?;
    paths.retain(|path| !is_catalog_file(path, &catalog_path));

    // --- Phase 2: Resolve ---
    progress.phase("Resolving hierarchy");
    let classifier = PatternClassifier::new(&request.scan.instance_patterns)?;
    let markers = StructuralMarkers::from_names(&request.scan.structural_markers);
    let mut resolver =
        HierarchyResolver::new(CatalogBuilder::new(), |s: &str| classifier.classify(s))
            .with_structural_markers(markers);

    let mut skipped = Vec::new();
    let resolved = resolve_all(&mut resolver, request, &paths, &mut skipped, progress);
    let disposed = resolver.dispose();
    resolved.and(disposed)?;

    let catalog = resolver.factory().finish(&request.root);

    // --- Phase 3: Write ---
    progress.phase("Writing catalog");
    write_catalog(&catalog_path, &catalog)?;

    let result = ScanResult {
        catalog_path,
        catalog_id: catalog.id.clone(),
        experiments: catalog.experiments.len(),
        instances: catalog.experiments.iter().map(|e| e.instances.len()).sum(),
        runs: catalog.run_count(),
        skipped,
        elapsed: start.elapsed(),
    };

    info!(
        experiments = result.experiments,
        instances = result.instances,
        runs = result.runs,
        skipped = result.skipped.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "scan complete"
    );
    progress.done(&result);

    Ok(result)
}

/// True if `path` is the catalog a previous scan wrote under the root.
fn is_catalog_file(path: &Path, catalog_path: &Path) -> bool {
    if path.file_name() != catalog_path.file_name() {
        return false;
    }
    let same = match (std::fs::canonicalize(path), std::fs::canonicalize(catalog_path)) {
        (Ok(a), Ok(b)) => a == b,
        _ => path == catalog_path,
    };
    if same {
        debug!(path = %path.display(), "ignoring previous catalog");
    }
    same
}

/// Feed every discovered path through the resolver and close its run.
///
/// Paths are made relative to the root first, so directories above the
/// root never take part in classification.
fn resolve_all<C>(
    resolver: &mut HierarchyResolver<CatalogBuilder, C>,
    request: &ScanRequest,
    paths: &[PathBuf],
    skipped: &mut Vec<PathBuf>,
    progress: &dyn ProgressReporter,
) -> Result<()>
where
    C: Fn(&str) -> Option<String>,
{
    let total = paths.len();
    for (i, path) in paths.iter().enumerate() {
        let source = path.strip_prefix(&request.root).unwrap_or(path);

        let mut run = match resolver.resolve(source) {
            Ok(run) => run,
            Err(e) if request.scan.skip_unclassified && e.is_classification() => {
                warn!(path = %source.display(), error = %e, "skipping unclassified path");
                skipped.push(source.to_path_buf());
                continue;
            }
            Err(e) => return Err(e),
        };

        run.set_source(source);
        run.close()?;
        progress.run_recorded(source, i + 1, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use benchtree_catalog::load_catalog;
    use benchtree_shared::BenchTreeError;
    use uuid::Uuid;

    use super::*;

    fn temp_tree(files: &[&str]) -> PathBuf {
        let root = std::env::temp_dir().join(format!("bt-scan-test-{}", Uuid::now_v7()));
        for rel in files {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "best 7542\n").unwrap();
        }
        root
    }

    fn request(root: &Path) -> ScanRequest {
        ScanRequest {
            root: root.to_path_buf(),
            output_dir: root.join("out"),
            scan: ScanConfig {
                instance_patterns: vec![r"^inst\w+$".into()],
                ..ScanConfig::default()
            },
        }
    }

    #[derive(Default)]
    struct Recorder {
        phases: RefCell<Vec<String>>,
        runs: RefCell<usize>,
    }

    impl ProgressReporter for Recorder {
        fn phase(&self, name: &str) {
            self.phases.borrow_mut().push(name.to_string());
        }
        fn run_recorded(&self, _source: &Path, _current: usize, _total: usize) {
            *self.runs.borrow_mut() += 1;
        }
        fn done(&self, _result: &ScanResult) {
            self.phases.borrow_mut().push("done".into());
        }
    }

    #[test]
    fn scan_builds_catalog() {
        let root = temp_tree(&[
            "expA/symmetric/instX/results/run1.txt",
            "expA/symmetric/instX/results/run2.txt",
            "expA/asymmetric/instY/results/run1.txt",
            "expB/instZ/run1.txt",
        ]);
        let recorder = Recorder::default();

        let result = scan(&request(&root), &recorder).unwrap();
        assert_eq!(result.experiments, 2);
        assert_eq!(result.instances, 3);
        assert_eq!(result.runs, 4);
        assert!(result.skipped.is_empty());
        assert_eq!(*recorder.runs.borrow(), 4);
        assert_eq!(recorder.phases.borrow().last().map(String::as_str), Some("done"));

        let catalog = load_catalog(&result.catalog_path).unwrap();
        assert_eq!(catalog.id, result.catalog_id);
        let exp_a = &catalog.experiments[0];
        assert_eq!(exp_a.name, "expA");
        // asymmetric sorts before symmetric
        assert_eq!(exp_a.instances[0].instance, "instY");
        assert_eq!(exp_a.instances[1].instance, "instX");
        assert_eq!(exp_a.instances[1].runs[1].source, "expA/symmetric/instX/results/run2.txt");
        assert_eq!(catalog.experiments[1].name, "expB");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn unclassified_path_aborts_by_default() {
        let root = temp_tree(&["expA/instX/run1.txt", "loose/run.txt"]);
        let err = scan(&request(&root), &SilentProgress).unwrap_err();
        assert!(matches!(err, BenchTreeError::Classification { .. }));
        assert!(!root.join("out").join("catalog.json").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn unclassified_path_skipped_when_configured() {
        let root = temp_tree(&["expA/instX/run1.txt", "instW/run.txt", "loose/run.txt"]);
        let mut req = request(&root);
        req.scan.skip_unclassified = true;

        let result = scan(&req, &SilentProgress).unwrap();
        assert_eq!(result.runs, 1);
        assert_eq!(result.skipped, vec![PathBuf::from("instW/run.txt"), PathBuf::from("loose/run.txt")]);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn rescan_ignores_previous_catalog() {
        let root = temp_tree(&["expA/instX/run1.txt", "expB/instZ/run1.txt"]);
        let mut req = request(&root);
        req.output_dir = root.clone();

        let first = scan(&req, &SilentProgress).unwrap();
        assert_eq!(first.catalog_path, root.join("catalog.json"));
        let second = scan(&req, &SilentProgress).unwrap();
        assert_eq!(second.runs, 2);
        assert!(second.skipped.is_empty());
        assert_ne!(first.catalog_id, second.catalog_id);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn catalog_in_nested_output_dir_is_ignored() {
        let root = temp_tree(&["expA/instX/run1.txt"]);
        let req = request(&root);

        scan(&req, &SilentProgress).unwrap();
        assert!(root.join("out").join("catalog.json").exists());
        let again = scan(&req, &SilentProgress).unwrap();
        assert_eq!(again.runs, 1);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn directories_above_root_are_ignored() {
        let outer = temp_tree(&["campaign/instX/run1.txt"]);
        let mut req = request(&outer.join("campaign"));
        req.scan.skip_unclassified = true;

        let result = scan(&req, &SilentProgress).unwrap();
        assert_eq!(result.runs, 0);
        assert_eq!(result.skipped.len(), 1);
        std::fs::remove_dir_all(&outer).ok();
    }
}
