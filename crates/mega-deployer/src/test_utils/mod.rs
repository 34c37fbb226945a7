//! Test utilities for the deployment engine.

mod abi;
mod client;

pub use abi::*;
pub use client::*;
