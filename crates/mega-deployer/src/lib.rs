//! Reconciliation engine for contract deployments.
//!
//! Given compiled artifacts, the snapshot left by the previous run and a declared deployment
//! configuration, the engine decides which contracts must be (re)deployed, deploys them
//! concurrently and then wires cross-contract references through configured setter calls.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod artifact;
pub use artifact::*;

mod client;
pub use client::*;

mod config;
pub use config::*;

mod engine;
pub use engine::*;

mod error;
pub use error::*;

mod executor;
pub use executor::*;

mod handle;
pub use handle::*;

mod injector;
pub use injector::*;

mod planner;
pub use planner::*;

mod state;
pub use state::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
