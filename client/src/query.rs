//! Read contract for a chain's governance module.

use async_trait::async_trait;
use govhub_types::{Address, ChainDescriptor, Proposal, ProposalId, TallyResult, VoteRecord};

use crate::error::ClientError;

/// `PROPOSAL_STATUS_VOTING_PERIOD` as a query parameter.
pub const PROPOSAL_STATUS_VOTING_PERIOD: u8 = 2;

/// Status the gateway answers with when an account has no vote on a proposal.
pub const NO_VOTE_STATUS: u16 = 400;

/// Governance queries against one chain's REST gateway.
///
/// Implementations report gateway status codes verbatim through
/// [`ClientError::Status`]; interpreting them is left to callers.
#[async_trait]
pub trait GovQuery: Send + Sync {
    /// Proposals currently in their voting period, without tallies.
    async fn voting_proposals(&self, chain: &ChainDescriptor) -> Result<Vec<Proposal>, ClientError>;

    /// Number of proposals currently in their voting period.
    async fn voting_proposal_count(&self, chain: &ChainDescriptor) -> Result<usize, ClientError>;

    /// Live tally of one proposal.
    async fn tally(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
    ) -> Result<TallyResult, ClientError>;

    /// The vote `voter` cast on a proposal.
    ///
    /// `Ok(None)` when the gateway answered but listed no options.
    async fn vote(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, ClientError>;
}
