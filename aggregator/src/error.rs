use govhub_registry::RegistryError;
use govhub_types::{ChainId, ProposalId, VoteOption};
use thiserror::Error;

/// Every failure the orchestrator surfaces to callers.
///
/// Per-chain and per-proposal variants are collected into reports next to
/// the successful results; only `FetchFailed`, `SignerUnavailable` and the
/// submission variants end a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("failed to fetch proposals on {chain_id}: {reason}")]
    FetchFailed { chain_id: ChainId, reason: String },

    #[error("tally unavailable for proposal {proposal_id} on {chain_id}: {reason}")]
    TallyUnavailable {
        chain_id: ChainId,
        proposal_id: ProposalId,
        reason: String,
    },

    #[error("failed to count active proposals on {chain_id}: {reason}")]
    CountFailed { chain_id: ChainId, reason: String },

    #[error("vote query for proposal {proposal_id} on {chain_id} failed: {reason}")]
    VoteQueryFailed {
        chain_id: ChainId,
        proposal_id: ProposalId,
        reason: String,
    },

    #[error("no signer available")]
    SignerUnavailable,

    #[error("signer could not bind {chain_id}: {reason}")]
    ChainBindingFailed { chain_id: ChainId, reason: String },

    #[error("not ready to vote on {chain_id}: {reason}")]
    NotReady { chain_id: ChainId, reason: String },

    #[error("{0} cannot be cast as a vote")]
    InvalidVoteOption(VoteOption),

    #[error("chain rejected the vote (code {code}): {raw_log}")]
    SubmissionRejected { code: u32, raw_log: String },

    #[error("vote submission failed: {0}")]
    SubmissionTransportFailed(String),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("config error: {0}")]
    Config(String),
}
