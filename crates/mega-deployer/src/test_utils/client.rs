use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy_primitives::{address, Address, Bytes, Selector, TxHash, B256};
use tokio::sync::Barrier;

use crate::{CallRequest, ChainClient, ClientError, DeployRequest};

/// Default account reported by [`MockChainClient`].
pub const MOCK_DEFAULT_ACCOUNT: Address = address!("00000000000000000000000000000000000000de");

/// First address handed out to a deployment by [`MockChainClient`].
const FIRST_DEPLOYED_ADDRESS: u64 = 0x1000;

#[derive(Debug, Default)]
struct MockState {
    deployments: Vec<DeployRequest>,
    calls: Vec<CallRequest>,
    default_account_queries: usize,
    next_address: u64,
    next_tx: u64,
    failing_bytecode: HashSet<Bytes>,
    failing_selectors: HashSet<Selector>,
}

/// In-memory [`ChainClient`] recording every transaction it receives.
///
/// Deployments get sequential addresses starting at `0x…1000`. Clones share the same record.
#[derive(Clone, Debug)]
pub struct MockChainClient {
    state: Arc<Mutex<MockState>>,
    default_account: Option<Address>,
    deploy_barrier: Option<Arc<Barrier>>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    /// Creates a client whose default account is [`MOCK_DEFAULT_ACCOUNT`].
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_address: FIRST_DEPLOYED_ADDRESS,
                ..Default::default()
            })),
            default_account: Some(MOCK_DEFAULT_ACCOUNT),
            deploy_barrier: None,
        }
    }

    /// Removes the default account, as for a node that manages no keys.
    pub fn without_default_account(mut self) -> Self {
        self.default_account = None;
        self
    }

    /// Makes every deployment wait until `count` deployments are in flight at once.
    pub fn with_deploy_barrier(mut self, count: usize) -> Self {
        self.deploy_barrier = Some(Arc::new(Barrier::new(count)));
        self
    }

    /// Makes deployments of `bytecode` revert.
    pub fn fail_deploy_of(self, bytecode: impl Into<Bytes>) -> Self {
        self.lock().failing_bytecode.insert(bytecode.into());
        self
    }

    /// Makes calls with the given selector revert.
    pub fn fail_calls_to(self, selector: Selector) -> Self {
        self.lock().failing_selectors.insert(selector);
        self
    }

    /// Deployments received so far, in submission order.
    pub fn deployments(&self) -> Vec<DeployRequest> {
        self.lock().deployments.clone()
    }

    /// Calls received so far, in submission order.
    pub fn calls(&self) -> Vec<CallRequest> {
        self.lock().calls.clone()
    }

    /// Number of times the default account was queried.
    pub fn default_account_queries(&self) -> usize {
        self.lock().default_account_queries
    }

    /// Total number of transactions received.
    pub fn transaction_count(&self) -> usize {
        let state = self.lock();
        state.deployments.len() + state.calls.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_tx_hash(state: &mut MockState) -> TxHash {
        state.next_tx += 1;
        B256::left_padding_from(&state.next_tx.to_be_bytes())
    }
}

/// Address encoded as the single argument of a setter call.
pub fn injected_address(call: &CallRequest) -> Address {
    Address::from_slice(&call.input[16..36])
}

impl ChainClient for MockChainClient {
    async fn default_account(&self) -> Result<Address, ClientError> {
        self.lock().default_account_queries += 1;
        self.default_account.ok_or(ClientError::NoDefaultAccount)
    }

    async fn deploy(&self, request: DeployRequest) -> Result<Address, ClientError> {
        if let Some(barrier) = &self.deploy_barrier {
            barrier.wait().await;
        }
        let mut state = self.lock();
        let fails = state.failing_bytecode.contains(&request.bytecode);
        state.deployments.push(request);
        let tx_hash = Self::next_tx_hash(&mut state);
        if fails {
            return Err(ClientError::Reverted(tx_hash));
        }
        let address = Address::left_padding_from(&state.next_address.to_be_bytes());
        state.next_address += 1;
        Ok(address)
    }

    async fn transact(&self, request: CallRequest) -> Result<TxHash, ClientError> {
        let mut state = self.lock();
        let fails = request.input.len() >= 4 &&
            state.failing_selectors.contains(&Selector::from_slice(&request.input[..4]));
        state.calls.push(request);
        let tx_hash = Self::next_tx_hash(&mut state);
        if fails {
            return Err(ClientError::Reverted(tx_hash));
        }
        Ok(tx_hash)
    }
}
