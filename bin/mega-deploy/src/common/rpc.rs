//! [`ChainClient`] backed by a JSON-RPC node that signs with its own accounts.

use std::time::Duration;

use alloy_network::{Ethereum, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, TxHash};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{TransactionReceipt, TransactionRequest};
use alloy_transport::TransportError;
use mega_deployer::{CallRequest, ChainClient, ClientError, DeployRequest};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{DeployCmdError, Result};

/// Default time to wait for a transaction receipt.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// JSON-RPC chain client.
///
/// Transactions are submitted with `eth_sendTransaction`, so the node fills in nonce and
/// signature. Receipts are polled until [`RpcClient::receipt_timeout`] elapses.
#[derive(Debug, Clone)]
pub struct RpcClient {
    provider: DynProvider<Ethereum>,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl RpcClient {
    /// Wraps an existing provider.
    pub fn new(provider: DynProvider<Ethereum>) -> Self {
        Self {
            provider,
            poll_interval: DEFAULT_POLL_INTERVAL,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    /// Creates a client for the HTTP endpoint at `rpc`. No request is made until first use.
    pub fn connect(rpc: &str) -> Result<Self> {
        let url = rpc
            .parse()
            .map_err(|e| DeployCmdError::InvalidInput(format!("Invalid RPC URL '{rpc}': {e}")))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<Ethereum>()
            .connect_http(url);
        Ok(Self::new(DynProvider::new(provider)))
    }

    /// Sets the interval between receipt polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets how long to wait for a receipt before giving up.
    pub fn with_receipt_timeout(mut self, receipt_timeout: Duration) -> Self {
        self.receipt_timeout = receipt_timeout;
        self
    }

    /// How long to wait for a receipt before giving up.
    pub fn receipt_timeout(&self) -> Duration {
        self.receipt_timeout
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> std::result::Result<u64, ClientError> {
        self.provider.get_chain_id().await.map_err(transport_error)
    }

    async fn send_and_wait(
        &self,
        tx: TransactionRequest,
    ) -> std::result::Result<TransactionReceipt, ClientError> {
        let pending = self.provider.send_transaction(tx).await.map_err(transport_error)?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "Transaction submitted");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status() {
            return Err(ClientError::Reverted(tx_hash));
        }
        Ok(receipt)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> std::result::Result<TransactionReceipt, ClientError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) =
                self.provider.get_transaction_receipt(tx_hash).await.map_err(transport_error)?
            {
                trace!(%tx_hash, elapsed = ?started.elapsed(), "Receipt available");
                return Ok(receipt);
            }
            let elapsed = started.elapsed();
            if elapsed >= self.receipt_timeout {
                return Err(ClientError::ReceiptTimeout { tx_hash, elapsed });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl ChainClient for RpcClient {
    async fn default_account(&self) -> std::result::Result<Address, ClientError> {
        let accounts = self.provider.get_accounts().await.map_err(transport_error)?;
        accounts.first().copied().ok_or(ClientError::NoDefaultAccount)
    }

    async fn deploy(&self, request: DeployRequest) -> std::result::Result<Address, ClientError> {
        let tx = TransactionRequest::default()
            .with_from(request.from)
            .with_deploy_code(request.bytecode)
            .with_gas_limit(request.gas_limit);
        let receipt = self.send_and_wait(tx).await?;
        let tx_hash = receipt.transaction_hash();
        receipt.contract_address().ok_or(ClientError::MissingContractAddress(tx_hash))
    }

    async fn transact(&self, request: CallRequest) -> std::result::Result<TxHash, ClientError> {
        let tx = TransactionRequest::default()
            .with_from(request.from)
            .with_to(request.to)
            .with_input(request.input)
            .with_gas_limit(request.gas_limit);
        let receipt = self.send_and_wait(tx).await?;
        Ok(receipt.transaction_hash())
    }
}

fn transport_error(err: TransportError) -> ClientError {
    ClientError::Transport(err.to_string())
}
