//! Scoped builder contexts the resolver drives.
//!
//! Each level of the output hierarchy is created by its parent and released
//! with `close`, which consumes the context so it can only happen once.

use benchtree_shared::Result;

/// Root object that opens experiment contexts.
pub trait ContextFactory {
    /// Experiment context produced by this factory.
    type Experiment: ExperimentContext;

    /// Open a new, unnamed experiment context.
    fn create_experiment(&mut self) -> Result<Self::Experiment>;
}

/// An open experiment.
pub trait ExperimentContext {
    /// Instance-runs context produced by this experiment.
    type InstanceRuns: InstanceRunsContext;

    /// Set the display name.
    fn set_name(&mut self, name: &str);

    /// Open a new instance-runs context under this experiment.
    fn create_instance_runs(&mut self) -> Result<Self::InstanceRuns>;

    /// Release the experiment. Called once, after all of its children are closed.
    fn close(self) -> Result<()>;
}

/// The runs of one instance within an experiment.
pub trait InstanceRunsContext {
    /// Handle returned to the caller for each run. The caller owns it.
    type Run;

    /// Set the canonical instance identifier.
    fn set_instance(&mut self, instance: &str);

    /// Create a fresh run context.
    fn create_run(&mut self) -> Result<Self::Run>;

    /// Release the instance runs.
    fn close(self) -> Result<()>;
}

/// The run handle type reachable from a factory.
pub type RunOf<F> = <<<F as ContextFactory>::Experiment as ExperimentContext>::InstanceRuns as InstanceRunsContext>::Run;
