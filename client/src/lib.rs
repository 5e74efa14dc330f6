//! Everything govhub consumes from the outside world.
//!
//! - [`GovQuery`]: read access to a chain's governance REST gateway, with
//!   [`HttpGovClient`] as the `reqwest`-backed implementation.
//! - [`Signer`]: the opaque signing capability (chain authorization, account
//!   lookup, sign-and-broadcast), with [`WatchOnlySigner`] for read-only use.

pub mod error;
pub mod http;
pub mod query;
pub mod signer;
pub mod wire;

pub use error::{ClientError, SignerError};
pub use http::HttpGovClient;
pub use query::{GovQuery, NO_VOTE_STATUS, PROPOSAL_STATUS_VOTING_PERIOD};
pub use signer::{Signer, WatchOnlySigner};
