//! Network seam used by the engine to talk to a chain.

use std::{future::Future, time::Duration};

use alloy_primitives::{Address, Bytes, TxHash};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::DeploymentTarget;

/// Errors reported by a [`ChainClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// RPC transport error
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// Transaction was included but reverted
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    /// Creation receipt without a contract address
    #[error("receipt of transaction {0} has no contract address")]
    MissingContractAddress(TxHash),

    /// No receipt arrived in time
    #[error("no receipt for transaction {tx_hash} after {elapsed:?}")]
    ReceiptTimeout {
        /// Hash of the submitted transaction
        tx_hash: TxHash,
        /// Time spent waiting
        elapsed: Duration,
    },

    /// The node manages no account to sign with
    #[error("node has no default account")]
    NoDefaultAccount,
}

/// A contract-creation transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployRequest {
    /// Sender.
    pub from: Address,
    /// Creation bytecode.
    pub bytecode: Bytes,
    /// Gas limit.
    pub gas_limit: u64,
}

/// A state-changing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    /// Sender.
    pub from: Address,
    /// Called contract.
    pub to: Address,
    /// Calldata, selector included.
    pub input: Bytes,
    /// Gas limit.
    pub gas_limit: u64,
}

/// Capabilities the engine needs from a blockchain node.
///
/// Both transaction methods resolve only once the transaction has a receipt. Timeouts are the
/// implementation's concern; a call that never resolves stalls the phase that issued it.
pub trait ChainClient: Sync {
    /// Returns the account used when a target declares no sender.
    fn default_account(&self) -> impl Future<Output = Result<Address, ClientError>> + Send;

    /// Submits a contract-creation transaction and returns the deployed address.
    fn deploy(
        &self,
        request: DeployRequest,
    ) -> impl Future<Output = Result<Address, ClientError>> + Send;

    /// Submits a state-changing call and returns its transaction hash.
    fn transact(
        &self,
        request: CallRequest,
    ) -> impl Future<Output = Result<TxHash, ClientError>> + Send;
}

/// Resolves the sender of each transaction of a run.
///
/// The default account is fetched lazily and at most once, so a run that issues no transaction
/// never queries it.
#[derive(Debug)]
pub struct Senders<'a, C> {
    client: &'a C,
    default_account: OnceCell<Address>,
}

impl<'a, C: ChainClient> Senders<'a, C> {
    /// Creates a resolver backed by `client`.
    pub fn new(client: &'a C) -> Self {
        Self { client, default_account: OnceCell::new() }
    }

    /// Returns the sender declared by `target`, or the node's default account.
    pub async fn resolve(&self, target: Option<&DeploymentTarget>) -> Result<Address, ClientError> {
        if let Some(from) = target.and_then(|target| target.from) {
            return Ok(from);
        }
        let account = self
            .default_account
            .get_or_try_init(|| async {
                let account = self.client.default_account().await?;
                debug!(%account, "Resolved default account");
                Ok::<_, ClientError>(account)
            })
            .await?;
        Ok(*account)
    }
}
