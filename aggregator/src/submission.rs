//! Vote submission orchestration.
//!
//! A submission walks a fixed state machine:
//!
//! ```text
//! Idle -> Signing -> Broadcasting -> Confirmed | Rejected | Failed
//!            \-> Failed
//! ```
//!
//! Every transition is published on a broadcast channel so observers (the
//! HTTP layer, tests) can follow progress without polling. There is no
//! retry and no duplicate-submission guard.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn, Instrument};

use govhub_client::Signer;
use govhub_types::{
    Address, ChainDescriptor, ChainId, Fee, ProposalId, VoteMsg, VoteOption, VoteRecord,
    VoteStatus,
};

use crate::cache::AggregationCache;
use crate::metrics::{AggregatorMetrics, OUTCOME_CONFIRMED, OUTCOME_FAILED, OUTCOME_REJECTED};
use crate::tracing_spans::submit_span;
use crate::AggregatorError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Signing,
    Broadcasting,
    Confirmed { tx_hash: Option<String> },
    Rejected { code: u32, raw_log: String },
    Failed { reason: String },
}

impl SubmissionState {
    pub fn can_advance_to(&self, next: &SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Idle, Signing)
                | (Signing, Broadcasting)
                | (Signing, Failed { .. })
                | (Broadcasting, Confirmed { .. })
                | (Broadcasting, Rejected { .. })
                | (Broadcasting, Failed { .. })
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. } | Self::Rejected { .. } | Self::Failed { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionEvent {
    pub chain_id: ChainId,
    pub proposal_id: ProposalId,
    pub state: SubmissionState,
}

#[derive(Clone, Debug)]
pub struct VoteRequest {
    pub chain: ChainDescriptor,
    pub proposal_id: ProposalId,
    pub address: Address,
    pub option: VoteOption,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub chain_id: ChainId,
    pub proposal_id: ProposalId,
    pub option: VoteOption,
    pub tx_hash: Option<String>,
}

pub struct VoteSubmitter {
    cache: Arc<AggregationCache>,
    metrics: Arc<AggregatorMetrics>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl VoteSubmitter {
    pub fn new(cache: Arc<AggregationCache>, metrics: Arc<AggregatorMetrics>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            cache,
            metrics,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    /// Sign and broadcast a single vote.
    ///
    /// Fails with `NotReady` before any signer call if no signer is attached
    /// or `request.address` is not the address bound for the chain. On a
    /// confirmed broadcast the cached vote is set to the submitted option.
    pub async fn submit_vote(
        &self,
        signer: Option<&Arc<dyn Signer>>,
        request: &VoteRequest,
    ) -> Result<SubmissionReceipt, AggregatorError> {
        let span = submit_span(request.chain.chain_id.as_str(), request.proposal_id.as_str());
        self.submit(signer, request).instrument(span).await
    }

    async fn submit(
        &self,
        signer: Option<&Arc<dyn Signer>>,
        request: &VoteRequest,
    ) -> Result<SubmissionReceipt, AggregatorError> {
        let chain_id = request.chain.chain_id.clone();
        if !request.option.is_castable() {
            return Err(AggregatorError::InvalidVoteOption(request.option));
        }
        let signer = signer.ok_or_else(|| AggregatorError::NotReady {
            chain_id: chain_id.clone(),
            reason: "no signer attached".into(),
        })?;
        if self.cache.address(&chain_id).await.as_ref() != Some(&request.address) {
            return Err(AggregatorError::NotReady {
                chain_id,
                reason: format!("{} is not the address bound for this chain", request.address),
            });
        }

        let mut progress = Progress::new(self, request);
        progress.advance(SubmissionState::Signing);

        if let Err(e) = signer.enable(&chain_id).await {
            return Err(progress.fail(e.to_string()));
        }

        let msg = VoteMsg {
            proposal_id: request.proposal_id.clone(),
            voter: request.address.clone(),
            option: request.option,
        };
        let fee = Fee::fixed(&request.chain.denom);
        progress.advance(SubmissionState::Broadcasting);
        debug!(signer = signer.name(), option = %request.option, "broadcasting vote");

        let result = match signer
            .sign_and_broadcast(&request.chain, &request.address, &[msg], &fee)
            .await
        {
            Ok(result) => result,
            Err(e) => return Err(progress.fail(e.to_string())),
        };

        if !result.accepted() {
            warn!(code = result.code, raw_log = %result.raw_log, "vote rejected by chain");
            self.metrics.record_submission(OUTCOME_REJECTED);
            progress.advance(SubmissionState::Rejected {
                code: result.code,
                raw_log: result.raw_log.clone(),
            });
            return Err(AggregatorError::SubmissionRejected {
                code: result.code,
                raw_log: result.raw_log,
            });
        }

        let recorded = self
            .cache
            .store_vote_if_bound(
                chain_id.clone(),
                request.proposal_id.clone(),
                &request.address,
                VoteStatus::present(VoteRecord::full(request.option)),
            )
            .await;
        if !recorded {
            debug!("binding changed during broadcast, vote not recorded locally");
        }
        self.metrics.record_submission(OUTCOME_CONFIRMED);
        progress.advance(SubmissionState::Confirmed {
            tx_hash: result.tx_hash.clone(),
        });
        info!(tx_hash = ?result.tx_hash, "vote confirmed");

        Ok(SubmissionReceipt {
            chain_id,
            proposal_id: request.proposal_id.clone(),
            option: request.option,
            tx_hash: result.tx_hash,
        })
    }
}

/// Tracks one submission's state and publishes each transition.
struct Progress<'a> {
    submitter: &'a VoteSubmitter,
    chain_id: ChainId,
    proposal_id: ProposalId,
    state: SubmissionState,
}

impl<'a> Progress<'a> {
    fn new(submitter: &'a VoteSubmitter, request: &VoteRequest) -> Self {
        Self {
            submitter,
            chain_id: request.chain.chain_id.clone(),
            proposal_id: request.proposal_id.clone(),
            state: SubmissionState::Idle,
        }
    }

    fn advance(&mut self, next: SubmissionState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "illegal submission transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next.clone();
        // No subscribers is fine.
        let _ = self.submitter.events.send(SubmissionEvent {
            chain_id: self.chain_id.clone(),
            proposal_id: self.proposal_id.clone(),
            state: next,
        });
    }

    fn fail(&mut self, reason: String) -> AggregatorError {
        warn!(reason = %reason, "vote submission failed");
        self.submitter.metrics.record_submission(OUTCOME_FAILED);
        self.advance(SubmissionState::Failed {
            reason: reason.clone(),
        });
        AggregatorError::SubmissionTransportFailed(reason)
    }
}
