//! Proposal fetch with per-proposal tally fan-out.

use futures_util::{stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn, Instrument};

use govhub_client::GovQuery;
use govhub_types::{ChainDescriptor, ChainId, Proposal};

use crate::metrics::AggregatorMetrics;
use crate::tracing_spans::{chain_fetch_span, tally_span};
use crate::AggregatorError;

/// Result of a successful proposal-list fetch.
///
/// Proposals whose tally could not be loaded are still listed, with
/// `tally: None`, and the failure is recorded in `tally_failures`.
#[derive(Clone, Debug)]
pub struct FetchedProposals {
    pub chain_id: ChainId,
    pub proposals: Vec<Proposal>,
    pub tally_failures: Vec<AggregatorError>,
}

pub struct ProposalFetcher {
    query: Arc<dyn GovQuery>,
    metrics: Arc<AggregatorMetrics>,
    tally_concurrency: usize,
}

impl ProposalFetcher {
    pub fn new(
        query: Arc<dyn GovQuery>,
        metrics: Arc<AggregatorMetrics>,
        tally_concurrency: usize,
    ) -> Self {
        Self {
            query,
            metrics,
            tally_concurrency: tally_concurrency.max(1),
        }
    }

    /// Fetch the chain's voting-period proposals and attach each tally.
    ///
    /// Only a failure of the list request itself is an error. The output
    /// keeps the order the chain listed the proposals in.
    pub async fn fetch_active(
        &self,
        chain: &ChainDescriptor,
    ) -> Result<FetchedProposals, AggregatorError> {
        self.fetch(chain)
            .instrument(chain_fetch_span(chain.chain_id.as_str()))
            .await
    }

    async fn fetch(&self, chain: &ChainDescriptor) -> Result<FetchedProposals, AggregatorError> {
        self.metrics.proposal_fetches.inc();
        let started = Instant::now();

        let listed = match self.query.voting_proposals(chain).await {
            Ok(listed) => listed,
            Err(e) => {
                self.metrics.fetch_failures.inc();
                warn!(error = %e, "proposal list request failed");
                return Err(AggregatorError::FetchFailed {
                    chain_id: chain.chain_id.clone(),
                    reason: e.to_string(),
                });
            }
        };
        debug!(count = listed.len(), "fetched proposal list");

        let settled: Vec<(Proposal, Option<AggregatorError>)> = stream::iter(listed)
            .map(|proposal| self.attach_tally(chain, proposal))
            .buffered(self.tally_concurrency)
            .collect()
            .await;

        let mut proposals = Vec::with_capacity(settled.len());
        let mut tally_failures = Vec::new();
        for (proposal, failure) in settled {
            proposals.push(proposal);
            tally_failures.extend(failure);
        }

        self.metrics
            .fetch_duration_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            proposals = proposals.len(),
            tally_failures = tally_failures.len(),
            "proposal fetch complete"
        );

        Ok(FetchedProposals {
            chain_id: chain.chain_id.clone(),
            proposals,
            tally_failures,
        })
    }

    async fn attach_tally(
        &self,
        chain: &ChainDescriptor,
        mut proposal: Proposal,
    ) -> (Proposal, Option<AggregatorError>) {
        let span = tally_span(proposal.id.as_str());
        match self.query.tally(chain, &proposal.id).instrument(span).await {
            Ok(tally) => {
                proposal.tally = Some(tally);
                (proposal, None)
            }
            Err(e) => {
                self.metrics.tally_failures.inc();
                warn!(proposal = %proposal.id, error = %e, "tally unavailable");
                proposal.tally = None;
                let failure = AggregatorError::TallyUnavailable {
                    chain_id: chain.chain_id.clone(),
                    proposal_id: proposal.id.clone(),
                    reason: e.to_string(),
                };
                (proposal, Some(failure))
            }
        }
    }
}
