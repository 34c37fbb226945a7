use mega_deployer::{ClientError, RunFailure};

use super::CompileError;

/// Error types for the mega-deploy command
#[derive(Debug, thiserror::Error)]
pub enum DeployCmdError {
    /// Reconciliation run failed
    #[error(transparent)]
    Run(#[from] RunFailure),

    /// Contract compilation failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// RPC error outside of a run
    #[error("RPC error: {0}")]
    Rpc(#[from] ClientError),

    /// Failed to read a file
    #[error("Failed to read '{file}': {source}")]
    FileRead {
        /// The file path that failed to load
        file: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse JSON content
    #[error("Failed to parse JSON from '{file}': {source}")]
    JsonParse {
        /// The file path where JSON parsing failed
        file: String,
        /// The underlying JSON parsing error
        source: serde_json::Error,
    },

    /// Failed to serialize JSON content
    #[error("Failed to serialize '{file}': {source}")]
    JsonSerialize {
        /// The file path being written
        file: String,
        /// The underlying JSON error
        source: serde_json::Error,
    },

    /// Failed to write a file
    #[error("Failed to write '{file}': {source}")]
    FileWrite {
        /// The file path that failed to write
        file: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to walk the contract directory
    #[error("Failed to scan '{dir}': {source}")]
    SourceScan {
        /// The directory being scanned
        dir: String,
        /// The underlying walk error
        source: walkdir::Error,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for the mega-deploy command
pub type Result<T> = std::result::Result<T, DeployCmdError>;
