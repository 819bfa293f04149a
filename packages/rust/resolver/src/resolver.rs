//! Stateful resolver that keeps experiment and instance-runs contexts open
//! across consecutive paths sharing an identity.

use std::path::{Path, PathBuf};

use benchtree_shared::{BenchTreeError, Result};
use tracing::{debug, warn};

use crate::context::{ContextFactory, ExperimentContext, InstanceRunsContext, RunOf};
use crate::segment::{Placement, StructuralMarkers, classify_ancestors};

/// Which contexts the resolver currently holds open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Nothing open.
    Empty,
    /// An experiment is open but has no instance runs.
    ExperimentOpen,
    /// An experiment and one of its instance runs are open.
    InstanceOpen,
}

struct OpenInstance<I> {
    context: I,
    identity: PathBuf,
}

// The instance slot lives inside the experiment slot, so an instance-runs
// context can never outlive or precede its experiment.
struct OpenExperiment<E: ExperimentContext> {
    context: E,
    identity: PathBuf,
    instance: Option<OpenInstance<E::InstanceRuns>>,
}

impl<E: ExperimentContext> OpenExperiment<E> {
    /// Close the child (if any), then the experiment. Both are attempted;
    /// the first failure is returned.
    fn close(mut self) -> Result<()> {
        let child = self.instance.take().map_or(Ok(()), close_instance);
        debug!(identity = %self.identity.display(), "closing experiment context");
        let parent = self.context.close().map_err(|e| {
            warn!(identity = %self.identity.display(), error = %e, "experiment close failed");
            BenchTreeError::resource_close("experiment", e)
        });
        child.and(parent)
    }
}

fn close_instance<I: InstanceRunsContext>(open: OpenInstance<I>) -> Result<()> {
    debug!(identity = %open.identity.display(), "closing instance runs context");
    open.context.close().map_err(|e| {
        warn!(identity = %open.identity.display(), error = %e, "instance runs close failed");
        BenchTreeError::resource_close("instance runs", e)
    })
}

/// Maps run paths onto experiment → instance runs → run contexts.
///
/// Call [`resolve`](Self::resolve) once per run path, then
/// [`dispose`](Self::dispose) when the stream ends. Paths that share an
/// instance directory should arrive consecutively; the open contexts are
/// reused only while the identity is unchanged.
pub struct HierarchyResolver<F: ContextFactory, C> {
    factory: F,
    classifier: C,
    markers: StructuralMarkers,
    experiment: Option<OpenExperiment<F::Experiment>>,
}

impl<F, C> HierarchyResolver<F, C>
where
    F: ContextFactory,
    C: Fn(&str) -> Option<String>,
{
    /// Create a resolver with the default structural markers.
    pub fn new(factory: F, classifier: C) -> Self {
        Self {
            factory,
            classifier,
            markers: StructuralMarkers::default(),
            experiment: None,
        }
    }

    /// Replace the structural marker set.
    pub fn with_structural_markers(mut self, markers: StructuralMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Classify `path` without touching any context.
    pub fn classify(&self, path: &Path) -> Result<Placement> {
        classify_ancestors(path, &self.classifier, &self.markers)
    }

    /// Return a fresh run context for `path`, opening or reusing the
    /// experiment and instance-runs contexts its ancestors identify.
    ///
    /// A classification failure leaves the open contexts untouched. A close
    /// failure during an identity change is returned after both closes were
    /// attempted; the closed slots are cleared and no replacement is opened.
    pub fn resolve(&mut self, path: &Path) -> Result<RunOf<F>> {
        let placement = self.classify(path)?;

        if self.instance_identity() == Some(placement.instance_path.as_path()) {
            debug!(instance = %placement.instance, "reusing instance runs context");
        } else {
            self.transition(&placement)?;
        }

        match self.experiment.as_mut().and_then(|e| e.instance.as_mut()) {
            Some(open) => open.context.create_run(),
            None => Err(BenchTreeError::Context(format!(
                "no instance runs context open for {}",
                path.display()
            ))),
        }
    }

    /// Close whatever is still open, instance runs first. Safe to call repeatedly.
    pub fn dispose(&mut self) -> Result<()> {
        match self.experiment.take() {
            Some(open) => open.close(),
            None => Ok(()),
        }
    }

    fn transition(&mut self, placement: &Placement) -> Result<()> {
        let keep_experiment = self.experiment_identity() == Some(placement.experiment_path.as_path());

        let closed = match self.experiment.take() {
            Some(mut open) if keep_experiment => {
                let closed = open.instance.take().map_or(Ok(()), close_instance);
                self.experiment = Some(open);
                closed
            }
            Some(open) => open.close(),
            None => Ok(()),
        };
        closed?;

        if self.experiment.is_none() {
            let mut context = self.factory.create_experiment()?;
            context.set_name(&placement.experiment);
            debug!(
                experiment = %placement.experiment,
                identity = %placement.experiment_path.display(),
                "opened experiment context"
            );
            self.experiment = Some(OpenExperiment {
                context,
                identity: placement.experiment_path.clone(),
                instance: None,
            });
        }
        let Some(experiment) = self.experiment.as_mut() else {
            return Err(BenchTreeError::Context("experiment context missing".into()));
        };

        let mut runs = experiment.context.create_instance_runs()?;
        runs.set_instance(&placement.instance);
        debug!(
            instance = %placement.instance,
            identity = %placement.instance_path.display(),
            "opened instance runs context"
        );
        experiment.instance = Some(OpenInstance {
            context: runs,
            identity: placement.instance_path.clone(),
        });
        Ok(())
    }
}

impl<F: ContextFactory, C> HierarchyResolver<F, C> {
    /// Current lifecycle state.
    pub fn state(&self) -> ResolverState {
        match &self.experiment {
            None => ResolverState::Empty,
            Some(open) if open.instance.is_none() => ResolverState::ExperimentOpen,
            Some(_) => ResolverState::InstanceOpen,
        }
    }

    /// Identity path of the open experiment.
    pub fn experiment_identity(&self) -> Option<&Path> {
        self.experiment.as_ref().map(|e| e.identity.as_path())
    }

    /// Identity path of the open instance runs.
    pub fn instance_identity(&self) -> Option<&Path> {
        self.experiment
            .as_ref()
            .and_then(|e| e.instance.as_ref())
            .map(|i| i.identity.as_path())
    }

    /// The context factory, e.g. to collect what closed contexts produced.
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: ContextFactory, C> Drop for HierarchyResolver<F, C> {
    fn drop(&mut self) {
        if let Some(open) = self.experiment.take() {
            warn!(identity = %open.identity.display(), "resolver dropped without dispose, closing contexts");
            if let Err(e) = open.close() {
                warn!(error = %e, "close during drop failed");
            }
        }
    }
}
