//! Injection phase: hands contracts the addresses of the contracts they depend on.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    CallRequest, ChainClient, ContractHandle, DeployConfig, DeployError, InjectSpec, Plan, Result,
    RunOptions, Senders, TxContext,
};

/// Counts of the injections handled by a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InjectReport {
    /// Setter calls issued and confirmed.
    pub issued: usize,
    /// Setter calls skipped because both endpoints were unchanged.
    pub skipped: usize,
}

/// A validated setter call waiting to be issued.
#[derive(Debug)]
struct SetterCall<'a> {
    contract: &'a str,
    spec: &'a InjectSpec,
    to: Address,
    value: Address,
    input: Bytes,
}

/// Performs every injection declared in `config`.
///
/// Must run after every contract of `plan` has an address. All entries are validated before the
/// first call is issued: a reference without an address fails with
/// [`DeployError::UnsatisfiedDependency`], a setter the ABI does not declare as `method(address)`
/// fails with [`DeployError::UnknownMethod`].
///
/// An injection is skipped when both contracts were unchanged and the owner's record does not
/// contradict it, i.e. the record either lists the injection or predates injection tracking.
/// Issued calls run concurrently; the phase waits for all of them before reporting the first
/// failure. On return, each contract's injection record lists what is known to be in place.
pub async fn inject<C: ChainClient>(
    client: &C,
    config: &DeployConfig,
    plan: &mut Plan,
    handles: &BTreeMap<String, ContractHandle>,
    senders: &Senders<'_, C>,
    options: &RunOptions,
) -> Result<InjectReport> {
    let mut report = InjectReport::default();
    let mut in_place: BTreeMap<&str, Vec<InjectSpec>> = BTreeMap::new();
    let mut calls = Vec::new();

    for (name, target) in config {
        for spec in &target.inject {
            let unsatisfied = || DeployError::UnsatisfiedDependency {
                contract: name.clone(),
                reference: spec.reference.clone(),
            };
            let value = plan.address_of(&spec.reference).ok_or_else(unsatisfied)?;
            let handle =
                handles.get(name).ok_or_else(|| DeployError::UnboundContract(name.clone()))?;
            let setter = handle.address_setter(&spec.method).ok_or_else(|| {
                DeployError::UnknownMethod { contract: name.clone(), method: spec.method.clone() }
            })?;

            let recorded = plan.snapshot().get(name).and_then(|state| state.has_injected(spec));
            if plan.is_unchanged(name) &&
                plan.is_unchanged(&spec.reference) &&
                recorded.unwrap_or(true)
            {
                info!(
                    contract = %name,
                    dependency = %spec.reference,
                    "contract {name} and dependency {} unchanged",
                    spec.reference
                );
                in_place.entry(name).or_default().push(spec.clone());
                report.skipped += 1;
                continue;
            }

            let input = handle.encode_setter(setter, value).map_err(|source| {
                DeployError::Encoding {
                    contract: name.clone(),
                    method: spec.method.clone(),
                    source,
                }
            })?;
            calls.push(SetterCall { contract: name, spec, to: handle.address(), value, input });
        }
    }

    let pending = calls.into_iter().map(|call| async move {
        let result = async {
            let from = senders.resolve(config.get(call.contract)).await?;
            debug!(
                contract = call.contract,
                method = %call.spec.method,
                %from,
                "Submitting injection"
            );
            let request = CallRequest {
                from,
                to: call.to,
                input: call.input.clone(),
                gas_limit: options.gas_limit,
            };
            client.transact(request).await
        }
        .await;
        (call, result)
    });

    let mut failure = None;
    for (call, result) in join_all(pending).await {
        match result {
            Ok(tx_hash) => {
                info!(
                    contract = call.contract,
                    %tx_hash,
                    "injected {}({}) via {}({}).{}",
                    call.spec.reference,
                    call.value,
                    call.contract,
                    call.to,
                    call.spec.method
                );
                in_place.entry(call.contract).or_default().push(call.spec.clone());
                report.issued += 1;
            }
            Err(source) => {
                warn!(
                    contract = call.contract,
                    method = %call.spec.method,
                    error = %source,
                    "Injection failed"
                );
                failure.get_or_insert(DeployError::TransactionFailure {
                    context: TxContext::Inject {
                        contract: call.contract.to_string(),
                        reference: call.spec.reference.clone(),
                        method: call.spec.method.clone(),
                    },
                    source,
                });
            }
        }
    }

    for (name, state) in plan.states_mut() {
        let mut record = in_place.remove(name.as_str()).unwrap_or_default();
        record.sort();
        record.dedup();
        state.injected = Some(record);
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(report),
    }
}
