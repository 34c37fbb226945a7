//! Persisted deployment snapshot.

use std::collections::BTreeMap;

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::{ContractArtifact, InjectSpec};

/// Deployment record of a single contract.
///
/// `bytecode` is always the code that was (or is about to be) deployed at `address`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractState {
    /// Interface description.
    pub abi: JsonAbi,
    /// Creation bytecode.
    #[serde(rename = "code")]
    pub bytecode: Bytes,
    /// Address of the confirmed deployment. Absent while the contract is known but not deployed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Injections confirmed against the contract living at `address`.
    ///
    /// `None` for records that predate injection tracking, in which case the engine assumes any
    /// injection between two unchanged contracts has already been made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injected: Option<Vec<InjectSpec>>,
}

impl ContractState {
    /// Creates an undeployed record from a compiled artifact.
    pub fn from_artifact(artifact: &ContractArtifact) -> Self {
        Self {
            abi: artifact.abi.clone(),
            bytecode: artifact.bytecode.clone(),
            address: None,
            injected: None,
        }
    }

    /// Returns true if a deployment of this record has been confirmed.
    pub const fn is_deployed(&self) -> bool {
        self.address.is_some()
    }

    /// Returns whether `spec` is known to have been injected into this contract, or `None` when
    /// the record does not track injections.
    pub fn has_injected(&self, spec: &InjectSpec) -> Option<bool> {
        self.injected.as_ref().map(|injected| injected.contains(spec))
    }
}

/// Snapshot of every tracked contract, keyed by contract name.
pub type StateSnapshot = BTreeMap<String, ContractState>;
