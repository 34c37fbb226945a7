use crate::ClientError;

/// The on-chain action a failed transaction belonged to.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum TxContext {
    /// Contract-creation transaction.
    #[display("deployment of contract {_0}")]
    Deploy(String),
    /// Setter call performed during injection.
    #[display("injection of {reference} via {contract}.{method}")]
    Inject {
        /// Contract receiving the address.
        contract: String,
        /// Contract whose address is injected.
        reference: String,
        /// Setter invoked on `contract`.
        method: String,
    },
}

/// Error types for a reconciliation run
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A configured contract has no compiled artifact
    #[error("contract {0} not compiled")]
    MissingArtifact(String),

    /// An injection references a contract without a resolved address
    #[error("dependency {reference} of contract {contract} not satisfied")]
    UnsatisfiedDependency {
        /// Contract declaring the injection
        contract: String,
        /// Referenced contract
        reference: String,
    },

    /// An injection targets a method the contract does not expose as `method(address)`
    #[error("contract {contract} does not contain method {method}(address)")]
    UnknownMethod {
        /// Contract declaring the injection
        contract: String,
        /// Missing setter
        method: String,
    },

    /// A contract declaring injections was never bound to a deployed instance
    #[error("contract {0} has no deployed instance to inject into")]
    UnboundContract(String),

    /// The node rejected a transaction or it reverted
    #[error("{context} failed: {source}")]
    TransactionFailure {
        /// What the transaction was for
        context: TxContext,
        /// The underlying client error
        source: ClientError,
    },

    /// Setter calldata could not be encoded
    #[error("failed to encode call to {contract}.{method}: {source}")]
    Encoding {
        /// Contract declaring the injection
        contract: String,
        /// Setter being encoded
        method: String,
        /// The underlying ABI error
        source: alloy_dyn_abi::Error,
    },
}

/// Result type for the deployment engine
pub type Result<T> = std::result::Result<T, DeployError>;
