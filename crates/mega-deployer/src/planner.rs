//! Reconciliation planning: decides, per configured contract, whether it must be deployed.

use std::collections::BTreeSet;

use alloy_primitives::Address;
use tracing::{debug, trace};

use crate::{Artifacts, ContractState, DeployConfig, DeployError, Result, StateSnapshot};

/// Per-contract planning verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Verdict {
    /// Bytecode matches the prior snapshot and a prior address exists.
    #[display("unchanged")]
    Unchanged,
    /// The contract must be deployed in this run.
    #[display("needs deploy")]
    NeedsDeploy,
}

/// The in-memory snapshot of a run together with the verdicts it was planned with.
///
/// Verdicts are fixed at planning time: resolving an address during deployment does not turn a
/// contract into [`Verdict::Unchanged`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    state: StateSnapshot,
    unchanged: BTreeSet<String>,
}

impl Plan {
    /// Returns the verdict for `name`, or `None` if the contract is not part of the plan.
    pub fn verdict(&self, name: &str) -> Option<Verdict> {
        self.state.contains_key(name).then(|| {
            if self.unchanged.contains(name) {
                Verdict::Unchanged
            } else {
                Verdict::NeedsDeploy
            }
        })
    }

    /// Returns true if `name` was planned as unchanged.
    pub fn is_unchanged(&self, name: &str) -> bool {
        self.unchanged.contains(name)
    }

    /// Number of contracts planned as unchanged.
    pub fn unchanged_count(&self) -> usize {
        self.unchanged.len()
    }

    /// Resolved address of `name`, if any.
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.state.get(name).and_then(|state| state.address)
    }

    /// The snapshot being built by this run.
    pub const fn snapshot(&self) -> &StateSnapshot {
        &self.state
    }

    /// Consumes the plan, returning its snapshot.
    pub fn into_snapshot(self) -> StateSnapshot {
        self.state
    }

    pub(crate) fn state_mut(&mut self, name: &str) -> Option<&mut ContractState> {
        self.state.get_mut(name)
    }

    pub(crate) fn states_mut(&mut self) -> impl Iterator<Item = (&String, &mut ContractState)> {
        self.state.iter_mut()
    }
}

/// Computes the plan of a run from the configuration, the compiled artifacts and the prior
/// snapshot.
///
/// A contract is unchanged iff the prior snapshot holds the exact same bytecode for it together
/// with an address; its address and injection record are then carried forward. Every other
/// configured contract starts undeployed.
///
/// A carried-forward record keeps only the edges that are still configured and whose reference
/// is unchanged too, so it never vouches for an address the reference no longer has.
pub fn plan(config: &DeployConfig, artifacts: &Artifacts, prior: &StateSnapshot) -> Result<Plan> {
    let mut plan = Plan::default();

    for name in config.keys() {
        let artifact =
            artifacts.get(name).ok_or_else(|| DeployError::MissingArtifact(name.clone()))?;
        let mut state = ContractState::from_artifact(artifact);

        match prior.get(name) {
            Some(prev) if prev.bytecode == artifact.bytecode && prev.is_deployed() => {
                trace!(contract = %name, address = ?prev.address, "Bytecode unchanged");
                state.address = prev.address;
                state.injected = prev.injected.clone();
                plan.unchanged.insert(name.clone());
            }
            Some(prev) if prev.bytecode != artifact.bytecode => {
                debug!(contract = %name, "Bytecode changed since last run");
            }
            Some(_) => debug!(contract = %name, "No confirmed deployment on record"),
            None => debug!(contract = %name, "New contract"),
        }

        plan.state.insert(name.clone(), state);
    }

    let Plan { state, unchanged } = &mut plan;
    for name in unchanged.iter() {
        let Some(record) = state.get_mut(name).and_then(|state| state.injected.as_mut()) else {
            continue;
        };
        let configured = config.get(name).map(|target| target.inject.as_slice()).unwrap_or_default();
        record.retain(|spec| {
            let keep = configured.contains(spec) && unchanged.contains(&spec.reference);
            if !keep {
                trace!(contract = %name, dependency = %spec.reference, "Dropping stale injection");
            }
            keep
        });
    }

    debug!(
        contracts = plan.state.len(),
        unchanged = plan.unchanged.len(),
        "Reconciliation plan computed"
    );
    Ok(plan)
}
