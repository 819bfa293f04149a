//! In-memory contexts that materialize the resolved hierarchy into a [`Catalog`].
//!
//! Every context holds a weak handle on its parent's record list and commits
//! its own record there on `close`. A child closed after its parent fails
//! instead of writing into a record that has already been committed.

use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use benchtree_resolver::{ContextFactory, ExperimentContext, InstanceRunsContext};
use benchtree_shared::{
    BenchTreeError, CURRENT_SCHEMA_VERSION, Catalog, CatalogId, ExperimentRecord,
    InstanceRecord, Result, RunRecord,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

type Records<T> = Rc<RefCell<Vec<T>>>;

/// Push `record` into the parent list, if the parent is still open.
fn commit<T>(parent: &Weak<RefCell<Vec<T>>>, record: T, what: &str) -> Result<()> {
    let parent = parent
        .upgrade()
        .ok_or_else(|| BenchTreeError::Context(format!("{what} closed after its parent")))?;
    parent.borrow_mut().push(record);
    Ok(())
}

// ---------------------------------------------------------------------------
// CatalogBuilder
// ---------------------------------------------------------------------------

/// Root context factory; collects closed experiments.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    experiments: Records<ExperimentRecord>,
}

impl CatalogBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the closed experiments into a new [`Catalog`] for `root`.
    pub fn finish(&self, root: &Path) -> Catalog {
        let experiments = self.experiments.take();
        debug!(experiments = experiments.len(), "catalog finished");
        Catalog {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: CatalogId::new(),
            root: root.to_string_lossy().to_string(),
            created_at: Utc::now(),
            experiments,
        }
    }
}

impl ContextFactory for CatalogBuilder {
    type Experiment = ExperimentBuilder;

    fn create_experiment(&mut self) -> Result<ExperimentBuilder> {
        Ok(ExperimentBuilder {
            name: None,
            instances: Records::default(),
            parent: Rc::downgrade(&self.experiments),
        })
    }
}

// ---------------------------------------------------------------------------
// ExperimentBuilder
// ---------------------------------------------------------------------------

/// An open experiment record.
#[derive(Debug)]
pub struct ExperimentBuilder {
    name: Option<String>,
    instances: Records<InstanceRecord>,
    parent: Weak<RefCell<Vec<ExperimentRecord>>>,
}

impl ExperimentContext for ExperimentBuilder {
    type InstanceRuns = InstanceRunsBuilder;

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn create_instance_runs(&mut self) -> Result<InstanceRunsBuilder> {
        Ok(InstanceRunsBuilder {
            instance: None,
            runs: Records::default(),
            parent: Rc::downgrade(&self.instances),
        })
    }

    fn close(self) -> Result<()> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| BenchTreeError::validation("experiment closed without a name"))?;
        let record = ExperimentRecord {
            name,
            instances: self.instances.take(),
        };
        debug!(experiment = %record.name, instances = record.instances.len(), "experiment committed");
        commit(&self.parent, record, "experiment")
    }
}

// ---------------------------------------------------------------------------
// InstanceRunsBuilder
// ---------------------------------------------------------------------------

/// An open instance-runs record.
#[derive(Debug)]
pub struct InstanceRunsBuilder {
    instance: Option<String>,
    runs: Records<RunRecord>,
    parent: Weak<RefCell<Vec<InstanceRecord>>>,
}

impl InstanceRunsContext for InstanceRunsBuilder {
    type Run = RunBuilder;

    fn set_instance(&mut self, instance: &str) {
        self.instance = Some(instance.to_string());
    }

    fn create_run(&mut self) -> Result<RunBuilder> {
        Ok(RunBuilder {
            source: None,
            parent: Rc::downgrade(&self.runs),
        })
    }

    fn close(self) -> Result<()> {
        let instance = self
            .instance
            .filter(|i| !i.is_empty())
            .ok_or_else(|| {
                BenchTreeError::validation("instance runs closed without an instance identifier")
            })?;
        let record = InstanceRecord {
            instance,
            runs: self.runs.take(),
        };
        commit(&self.parent, record, "instance runs")
    }
}

// ---------------------------------------------------------------------------
// RunBuilder
// ---------------------------------------------------------------------------

/// A run handed to the caller; populate it, then `close` it before the
/// next path is resolved.
#[derive(Debug)]
pub struct RunBuilder {
    source: Option<String>,
    parent: Weak<RefCell<Vec<RunRecord>>>,
}

impl RunBuilder {
    /// Record where the run's result file lives, relative to the scan root.
    pub fn set_source(&mut self, source: &Path) {
        let normalized = source
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        self.source = Some(normalized);
    }

    /// Commit the run into its instance runs.
    pub fn close(self) -> Result<()> {
        let source = self
            .source
            .ok_or_else(|| BenchTreeError::validation("run closed without a source path"))?;
        let file_name = source.rsplit('/').next().map(str::to_string);
        let record = RunRecord {
            id: run_id(&source),
            source,
            file_name,
        };
        commit(&self.parent, record, "run")
    }
}

/// Stable run identifier: leading 16 hex digits of the source's SHA-256.
pub fn run_id(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..16].to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use benchtree_resolver::HierarchyResolver;

    use super::*;

    fn inst_prefix(segment: &str) -> Option<String> {
        segment.starts_with("inst").then(|| segment.to_string())
    }

    fn add_run(builder: &mut InstanceRunsBuilder, source: &str) {
        let mut run = builder.create_run().unwrap();
        run.set_source(Path::new(source));
        run.close().unwrap();
    }

    #[test]
    fn builds_nested_records() {
        let mut factory = CatalogBuilder::new();
        let mut exp = factory.create_experiment().unwrap();
        exp.set_name("expA");
        let mut inst = exp.create_instance_runs().unwrap();
        inst.set_instance("berlin52");
        add_run(&mut inst, "expA/berlin52/run1.txt");
        add_run(&mut inst, "expA/berlin52/run2.txt");
        inst.close().unwrap();
        exp.close().unwrap();

        let catalog = factory.finish(Path::new("/data"));
        assert_eq!(catalog.root, "/data");
        assert_eq!(catalog.experiments.len(), 1);
        let runs = &catalog.experiments[0].instances[0].runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].source, "expA/berlin52/run1.txt");
        assert_eq!(runs[0].file_name.as_deref(), Some("run1.txt"));
        assert_eq!(runs[0].id, run_id("expA/berlin52/run1.txt"));
        assert!(factory.finish(Path::new("/data")).experiments.is_empty());
    }

    #[test]
    fn unnamed_experiment_fails_to_close() {
        let mut factory = CatalogBuilder::new();
        let exp = factory.create_experiment().unwrap();
        let err = exp.close().unwrap_err();
        assert!(err.to_string().contains("without a name"));
        assert!(factory.finish(Path::new("/data")).experiments.is_empty());
    }

    #[test]
    fn instance_without_identifier_fails_to_close() {
        let mut factory = CatalogBuilder::new();
        let mut exp = factory.create_experiment().unwrap();
        let inst = exp.create_instance_runs().unwrap();
        assert!(inst.close().is_err());
    }

    #[test]
    fn run_without_source_fails_to_close() {
        let mut factory = CatalogBuilder::new();
        let mut exp = factory.create_experiment().unwrap();
        let mut inst = exp.create_instance_runs().unwrap();
        let run = inst.create_run().unwrap();
        assert!(run.close().unwrap_err().to_string().contains("source path"));
    }

    #[test]
    fn run_closed_after_instance_fails() {
        let mut factory = CatalogBuilder::new();
        let mut exp = factory.create_experiment().unwrap();
        exp.set_name("expA");
        let mut inst = exp.create_instance_runs().unwrap();
        inst.set_instance("instX");
        let mut late = inst.create_run().unwrap();
        late.set_source(Path::new("expA/instX/late.txt"));
        inst.close().unwrap();

        let err = late.close().unwrap_err();
        assert!(err.to_string().contains("run closed after its parent"));
    }

    #[test]
    fn run_id_is_stable() {
        assert_eq!(run_id("a/b.txt"), run_id("a/b.txt"));
        assert_ne!(run_id("a/b.txt"), run_id("a/c.txt"));
        assert_eq!(run_id("a/b.txt").len(), 16);
    }

    #[test]
    fn resolver_drives_catalog() {
        let mut resolver = HierarchyResolver::new(CatalogBuilder::new(), inst_prefix);
        let root = PathBuf::from("/data");
        for rel in [
            "expA/symmetric/instX/results/run1.txt",
            "expA/symmetric/instX/results/run2.txt",
            "expA/asymmetric/instY/results/run1.txt",
            "expB/instZ/run1.txt",
        ] {
            let mut run = resolver.resolve(&root.join(rel)).unwrap();
            run.set_source(Path::new(rel));
            run.close().unwrap();
        }
        resolver.dispose().unwrap();

        let catalog = resolver.factory().finish(&root);
        let names: Vec<_> = catalog.experiments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["expA", "expB"]);
        let a = &catalog.experiments[0];
        assert_eq!(a.instances.len(), 2);
        assert_eq!(a.instances[0].instance, "instX");
        assert_eq!(a.instances[0].runs.len(), 2);
        assert_eq!(a.instances[1].instance, "instY");
        assert_eq!(catalog.experiments[1].instances[0].runs[0].source, "expB/instZ/run1.txt");
        assert_eq!(catalog.run_count(), 4);
    }
}
