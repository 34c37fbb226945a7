use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes};
use serde_json::json;

use crate::{ContractArtifact, ContractState};

/// Builds a [`JsonAbi`] declaring one nonpayable function per `(name, input types)` entry.
pub fn abi_from_signatures(functions: &[(&str, &[&str])]) -> JsonAbi {
    let items = functions
        .iter()
        .map(|(name, inputs)| {
            let inputs = inputs
                .iter()
                .enumerate()
                .map(|(i, ty)| json!({ "name": format!("arg{i}"), "type": ty, "internalType": ty }))
                .collect::<Vec<_>>();
            json!({
                "type": "function",
                "name": name,
                "inputs": inputs,
                "outputs": [],
                "stateMutability": "nonpayable",
            })
        })
        .collect::<Vec<_>>();
    serde_json::from_value(serde_json::Value::Array(items)).expect("valid ABI")
}

/// Builds an artifact whose ABI declares a `setter(address)` function for each of `setters`.
pub fn artifact(name: &str, bytecode: &[u8], setters: &[&str]) -> ContractArtifact {
    let functions = setters.iter().map(|setter| (*setter, &["address"][..])).collect::<Vec<_>>();
    ContractArtifact::new(name, abi_from_signatures(&functions), Bytes::copy_from_slice(bytecode))
}

/// Returns the record of `artifact` deployed at `address`, without an injection record.
pub fn deployed(artifact: &ContractArtifact, address: Address) -> ContractState {
    ContractState { address: Some(address), ..ContractState::from_artifact(artifact) }
}
