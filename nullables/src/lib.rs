//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the aggregator (chain REST gateways, the
//! signing capability) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return scripted values per chain / proposal / account
//! - Can be changed programmatically mid-test
//! - Record every call for assertions
//! - Never touch the network
//!
//! Usage: swap [`govhub_client::HttpGovClient`] and real signers for these in tests.

pub mod fixtures;
pub mod query;
pub mod signer;

pub use query::{NullGovQuery, QueryCall};
pub use signer::{BroadcastOutcome, NullSigner, RecordedBroadcast};
