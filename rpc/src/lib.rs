//! JSON HTTP API for the governance aggregator.
//!
//! Serves the presentation layer's feed:
//! - Registered chains with activity counts and bound addresses
//! - The active chain's proposals with percentages and the account's vote
//! - Active-chain switching and manual refresh
//! - The full cache snapshot and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{RpcServer, RpcState};
