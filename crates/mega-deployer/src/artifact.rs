use std::collections::BTreeMap;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

/// Output of compiling a single contract. Produced once per compile pass and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// Contract name as declared in the source.
    pub name: String,
    /// Interface description.
    pub abi: JsonAbi,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Creates a new artifact.
    pub fn new(name: impl Into<String>, abi: JsonAbi, bytecode: impl Into<Bytes>) -> Self {
        Self { name: name.into(), abi, bytecode: bytecode.into() }
    }
}

/// Compiled artifacts keyed by contract name.
pub type Artifacts = BTreeMap<String, ContractArtifact>;
