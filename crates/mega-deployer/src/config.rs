//! Declared deployment targets.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A single dependency injection: once the owning contract is live, its `method` is called with
/// the address of contract `reference`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectSpec {
    /// Name of the contract whose address is injected.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Setter invoked on the owning contract. Must take a single `address` argument.
    pub method: String,
}

impl InjectSpec {
    /// Creates a new injection entry.
    pub fn new(reference: impl Into<String>, method: impl Into<String>) -> Self {
        Self { reference: reference.into(), method: method.into() }
    }
}

/// One entry of the deployment configuration. The contract name is the key under which the
/// target is stored in [`DeployConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentTarget {
    /// Sender of this contract's transactions. Falls back to the node's default account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Injections to perform on this contract, in call order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inject: Vec<InjectSpec>,
}

impl DeploymentTarget {
    /// Sets the sender of this contract's transactions.
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Appends an injection entry.
    pub fn with_inject(mut self, reference: impl Into<String>, method: impl Into<String>) -> Self {
        self.inject.push(InjectSpec::new(reference, method));
        self
    }
}

/// Deployment configuration keyed by contract name. Compiled contracts that are absent here are
/// ignored by the engine.
pub type DeployConfig = BTreeMap<String, DeploymentTarget>;
