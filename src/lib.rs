//! Client for the TopL1 basket contract on Base.
//!
//! A USDC deposit is swapped by the contract into five L1 assets at 20%
//! each; a withdrawal swaps everything back. This crate drives the wallet
//! side: session, network guard, allowance, and the deposit and
//! withdraw transactions.

pub mod config;
pub mod contracts;
pub mod errors;
pub mod flow;
pub mod model;
pub mod wallet;

pub use config::Deployment;
pub use errors::{FlowError, ProviderError};
pub use flow::Controller;
