//! Run orchestration: plan, deploy, then inject.

use tracing::{debug, info};

use crate::{
    deploy, inject, plan, Artifacts, ChainClient, DeployConfig, DeployError, Senders,
    StateSnapshot,
};

/// Gas limit of every transaction issued by a run unless configured otherwise.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

/// Options of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Only compute the plan; issue no transaction.
    pub dry_run: bool,
    /// Gas limit of deployment and injection transactions.
    pub gas_limit: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { dry_run: false, gas_limit: DEFAULT_GAS_LIMIT }
    }
}

impl RunOptions {
    /// Options for a dry run.
    pub fn dry_run() -> Self {
        Self { dry_run: true, ..Default::default() }
    }
}

/// Phases of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Phase {
    /// Reconciliation planning.
    #[display("planning")]
    Plan,
    /// Contract creation.
    #[display("deployment")]
    Deploy,
    /// Dependency injection.
    #[display("injection")]
    Inject,
}

/// Summary of a successful run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Whether the run stopped after planning.
    pub dry_run: bool,
    /// Contracts deployed by this run (or that would be, for a dry run).
    pub deployed: usize,
    /// Contracts whose prior deployment was kept.
    pub unchanged: usize,
    /// Injection calls issued.
    pub injected: usize,
    /// Injection calls skipped because both ends were unchanged.
    pub skipped_injections: usize,
}

/// Result of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome {
    /// Snapshot to persist.
    pub snapshot: StateSnapshot,
    /// Run summary.
    pub report: RunReport,
}

/// A failed run.
///
/// Deployments cannot be undone, so a run failing after planning still carries the in-memory
/// snapshot at the time of failure: confirmed deployments keep their addresses, failed ones have
/// none. It is up to the caller whether to persist it.
#[derive(Debug, thiserror::Error)]
#[error("{phase} failed: {error}")]
pub struct RunFailure {
    /// Phase the run failed in.
    pub phase: Phase,
    /// The underlying error.
    #[source]
    pub error: DeployError,
    /// Snapshot at the time of failure. `None` if no transaction could have been issued.
    pub snapshot: Option<StateSnapshot>,
}

/// Reconciles `config` against `prior` and the chain behind `client`.
///
/// `Start -> Planned -> DryRunDone` for a dry run, otherwise
/// `Start -> Planned -> Deployed -> Injected -> Done`. Every deployment settles before the first
/// injection is issued, since setter calls need final addresses.
pub async fn execute<C: ChainClient>(
    client: &C,
    config: &DeployConfig,
    prior: &StateSnapshot,
    artifacts: &Artifacts,
    options: &RunOptions,
) -> Result<RunOutcome, RunFailure> {
    let mut plan = plan(config, artifacts, prior).map_err(|error| RunFailure {
        phase: Phase::Plan,
        error,
        snapshot: None,
    })?;

    let mut report = RunReport {
        dry_run: options.dry_run,
        deployed: plan.snapshot().len() - plan.unchanged_count(),
        unchanged: plan.unchanged_count(),
        ..Default::default()
    };

    if options.dry_run {
        info!(deploy = report.deployed, unchanged = report.unchanged, "Dry run, skipping deployment");
        return Ok(RunOutcome { snapshot: plan.into_snapshot(), report });
    }

    let senders = Senders::new(client);

    debug!(pending = report.deployed, "Deploying contracts");
    let handles = match deploy(client, config, &mut plan, &senders, options).await {
        Ok(handles) => handles,
        Err(error) => {
            return Err(RunFailure {
                phase: Phase::Deploy,
                error,
                snapshot: Some(plan.into_snapshot()),
            })
        }
    };

    debug!("Injecting dependencies");
    let injections = match inject(client, config, &mut plan, &handles, &senders, options).await {
        Ok(injections) => injections,
        Err(error) => {
            return Err(RunFailure {
                phase: Phase::Inject,
                error,
                snapshot: Some(plan.into_snapshot()),
            })
        }
    };
    report.injected = injections.issued;
    report.skipped_injections = injections.skipped;

    Ok(RunOutcome { snapshot: plan.into_snapshot(), report })
}
