//! Deploys the Solidity contracts of a directory to a node and wires their dependencies.
//!
//! Every run compiles the sources, compares the result with the state file left by the previous
//! run, deploys what changed and calls the configured `setX(address)` methods. See
//! [`mega_deployer`] for the reconciliation rules.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cmd;
pub use cmd::*;

/// Building blocks shared by the command: compilation, files, RPC and logging
pub mod common;
