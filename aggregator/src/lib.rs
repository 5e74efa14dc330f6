//! Multi-chain governance aggregation and voting orchestrator.
//!
//! The aggregator is the core that:
//! - Fetches voting-period proposals for the active chain and fans out tally requests
//! - Counts active proposals on every registered chain on a fixed timer
//! - Binds a signer's accounts per chain, tolerating per-chain failures
//! - Tracks the bound account's vote on each proposal ("voted", "not voted", "unknown")
//! - Submits votes through the signer and updates the local view optimistically
//!
//! All state lives in one [`AggregationCache`] handed around by `Arc`.

pub mod activity;
pub mod aggregator;
pub mod background;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod submission;
pub mod tracing_spans;
pub mod vote_status;

pub use activity::{ActivityCounter, ActivityReport, ActivityTicker};
pub use aggregator::{Aggregator, AggregatorOptions, Refresh};
pub use background::BackgroundTasks;
pub use cache::{AggregationCache, CacheSnapshot, ChainTicket};
pub use config::AggregatorConfig;
pub use error::AggregatorError;
pub use fetcher::{FetchedProposals, ProposalFetcher};
pub use logging::{init_logging, LogFormat};
pub use metrics::AggregatorMetrics;
pub use session::{BindReport, WalletSession};
pub use submission::{
    SubmissionEvent, SubmissionReceipt, SubmissionState, VoteRequest, VoteSubmitter,
};
pub use vote_status::VoteStatusTracker;
