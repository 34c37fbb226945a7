//! Deployment phase: creates every contract the plan has no address for.

use std::collections::BTreeMap;

use alloy_primitives::Bytes;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    ChainClient, ContractHandle, DeployConfig, DeployError, DeployRequest, Plan, Result,
    RunOptions, Senders, TxContext,
};

/// Deploys every contract of `plan` that has no address yet and binds a handle to each contract.
///
/// Contracts that already carry an address are bound without issuing a transaction. All creation
/// transactions are in flight at the same time and the phase only returns once each of them has
/// a receipt or has failed. Confirmed addresses are written back into `plan` even when another
/// deployment fails, in which case the first failure (in contract name order) is returned.
pub async fn deploy<C: ChainClient>(
    client: &C,
    config: &DeployConfig,
    plan: &mut Plan,
    senders: &Senders<'_, C>,
    options: &RunOptions,
) -> Result<BTreeMap<String, ContractHandle>> {
    let mut handles = BTreeMap::new();
    let mut pending: Vec<(String, Bytes)> = Vec::new();

    for (name, state) in plan.snapshot() {
        match state.address {
            Some(address) => {
                info!(contract = %name, %address, "contract {name} unchanged");
                handles.insert(name.clone(), ContractHandle::bind(name, address, state.abi.clone()));
            }
            None => pending.push((name.clone(), state.bytecode.clone())),
        }
    }

    let deployments = pending.into_iter().map(|(name, bytecode)| async move {
        let result = async {
            let from = senders.resolve(config.get(&name)).await?;
            debug!(contract = %name, %from, code_size = bytecode.len(), "Submitting deployment");
            client.deploy(DeployRequest { from, bytecode, gas_limit: options.gas_limit }).await
        }
        .await;
        (name, result)
    });

    let mut failure = None;
    for (name, result) in join_all(deployments).await {
        match result {
            Ok(address) => {
                info!(contract = %name, %address, "contract {name} deployed at {address}");
                let Some(state) = plan.state_mut(&name) else { continue };
                state.address = Some(address);
                // Nothing has been injected into the new instance yet.
                state.injected = Some(Vec::new());
                handles.insert(name.clone(), ContractHandle::bind(&name, address, state.abi.clone()));
            }
            Err(source) => {
                warn!(contract = %name, error = %source, "Deployment failed");
                failure.get_or_insert(DeployError::TransactionFailure {
                    context: TxContext::Deploy(name),
                    source,
                });
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(handles),
    }
}
