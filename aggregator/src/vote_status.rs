//! Vote-status lookup for a bound account.

use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn, Instrument};

use govhub_client::{GovQuery, NO_VOTE_STATUS};
use govhub_types::{Address, ChainDescriptor, Proposal, ProposalId, VoteStatus};

use crate::metrics::AggregatorMetrics;
use crate::tracing_spans::vote_query_span;
use crate::AggregatorError;

pub struct VoteStatusTracker {
    query: Arc<dyn GovQuery>,
    metrics: Arc<AggregatorMetrics>,
}

impl VoteStatusTracker {
    pub fn new(query: Arc<dyn GovQuery>, metrics: Arc<AggregatorMetrics>) -> Self {
        Self { query, metrics }
    }

    /// Look up `address`'s vote on one proposal.
    ///
    /// The gateway's "no vote" status and an unspecified option both map to
    /// `Ok(VoteStatus::Absent)`; every other failure is `Err(VoteQueryFailed)`.
    pub async fn lookup(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
        address: &Address,
    ) -> Result<VoteStatus, AggregatorError> {
        self.metrics.vote_queries.inc();
        let span = vote_query_span(chain.chain_id.as_str(), proposal_id.as_str());
        match self.query.vote(chain, proposal_id, address).instrument(span).await {
            Ok(Some(record)) if record.option.is_castable() => Ok(VoteStatus::present(record)),
            Ok(_) => Ok(VoteStatus::Absent),
            Err(e) if e.status() == Some(NO_VOTE_STATUS) => Ok(VoteStatus::Absent),
            Err(e) => {
                self.metrics.vote_query_failures.inc();
                Err(AggregatorError::VoteQueryFailed {
                    chain_id: chain.chain_id.clone(),
                    proposal_id: proposal_id.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Like [`lookup`](Self::lookup), with failures kept as `QueryFailed`.
    pub async fn fetch_vote(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
        address: &Address,
    ) -> VoteStatus {
        match self.lookup(chain, proposal_id, address).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "vote query failed");
                VoteStatus::QueryFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Query every proposal's vote concurrently, in proposal order.
    pub async fn refresh_all(
        &self,
        chain: &ChainDescriptor,
        address: &Address,
        proposals: &[Proposal],
    ) -> Vec<(ProposalId, VoteStatus)> {
        let statuses = join_all(proposals.iter().map(|proposal| async move {
            let status = self.fetch_vote(chain, &proposal.id, address).await;
            (proposal.id.clone(), status)
        }))
        .await;
        debug!(chain = %chain.chain_id, queried = statuses.len(), "vote statuses refreshed");
        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govhub_client::ClientError;
    use govhub_nullables::{fixtures, NullGovQuery};
    use govhub_types::{VoteOption, VoteRecord};

    fn tracker(query: Arc<NullGovQuery>) -> VoteStatusTracker {
        VoteStatusTracker::new(query, Arc::new(AggregatorMetrics::new()))
    }

    #[tokio::test]
    async fn no_vote_status_is_absent_not_error() {
        let query = Arc::new(NullGovQuery::new());
        let status = tracker(query)
            .lookup(&fixtures::chain("c"), &ProposalId::new("1"), &Address::new("addr"))
            .await
            .unwrap();
        assert!(status.is_confirmed_absent());
    }

    #[tokio::test]
    async fn unspecified_option_is_absent() {
        let query = Arc::new(NullGovQuery::new());
        query.set_vote("c", "1", "addr", VoteRecord::full(VoteOption::Unspecified));
        let status = tracker(query)
            .lookup(&fixtures::chain("c"), &ProposalId::new("1"), &Address::new("addr"))
            .await
            .unwrap();
        assert_eq!(status, VoteStatus::Absent);
    }

    #[tokio::test]
    async fn other_failures_are_distinguishable() {
        let query = Arc::new(NullGovQuery::new());
        query.fail_vote(
            "c",
            "1",
            "addr",
            ClientError::Status {
                status: 500,
                body: "internal".into(),
            },
        );
        let tracker = tracker(query);
        let chain = fixtures::chain("c");
        let (id, addr) = (ProposalId::new("1"), Address::new("addr"));

        assert!(matches!(
            tracker.lookup(&chain, &id, &addr).await,
            Err(AggregatorError::VoteQueryFailed { .. })
        ));
        let status = tracker.fetch_vote(&chain, &id, &addr).await;
        assert!(status.is_failed());
        assert_eq!(status.displayed(), VoteStatus::Absent);
    }

    #[tokio::test]
    async fn refresh_all_keeps_proposal_order() {
        let query = Arc::new(NullGovQuery::new());
        query.set_vote("c", "2", "addr", VoteRecord::full(VoteOption::No));
        let proposals = vec![fixtures::proposal("1"), fixtures::proposal("2")];

        let statuses = tracker(query)
            .refresh_all(&fixtures::chain("c"), &Address::new("addr"), &proposals)
            .await;

        assert_eq!(statuses[0], (ProposalId::new("1"), VoteStatus::Absent));
        assert_eq!(
            statuses[1],
            (
                ProposalId::new("2"),
                VoteStatus::present(VoteRecord::full(VoteOption::No))
            )
        );
    }
}
