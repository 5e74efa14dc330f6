//! Fundamental types for govhub.
//!
//! This crate defines the data model shared across every other crate in the workspace:
//! chain descriptors, account addresses, proposals, tallies, vote options and the
//! vote message / fee shapes handed to a signer.

pub mod address;
pub mod chain;
pub mod error;
pub mod proposal;
pub mod tally;
pub mod tx;
pub mod vote;

pub use address::Address;
pub use chain::{ChainDescriptor, ChainId};
pub use error::TypesError;
pub use proposal::{Proposal, ProposalId};
pub use tally::{TallyResult, VotePercentages};
pub use tx::{BroadcastResult, Fee, VoteMsg};
pub use vote::{VoteOption, VoteRecord, VoteStatus, FULL_WEIGHT, VOTE_OPTIONS};
