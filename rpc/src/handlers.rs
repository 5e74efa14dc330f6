//! HTTP request handlers and their request/response bodies.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use govhub_aggregator::{CacheSnapshot, Refresh};
use govhub_types::{
    Address, ChainId, Proposal, ProposalId, TallyResult, VotePercentages, VoteStatus,
};

use crate::error::RpcError;
use crate::server::RpcState;

// ── Chains ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainSummary {
    pub chain_id: ChainId,
    pub display_name: String,
    pub denom: String,
    pub active: bool,
    /// Voting-period proposals; `None` when zero or unknown.
    pub active_proposals: Option<usize>,
    pub activity_error: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainsResponse {
    pub active_chain: Option<ChainId>,
    pub chains: Vec<ChainSummary>,
}

pub async fn list_chains(State(state): State<Arc<RpcState>>) -> Json<ChainsResponse> {
    let snapshot = state.aggregator.snapshot().await;
    let chains = state
        .aggregator
        .registry()
        .list()
        .iter()
        .map(|chain| ChainSummary {
            chain_id: chain.chain_id.clone(),
            display_name: chain.display_name.clone(),
            denom: chain.denom.clone(),
            active: snapshot.active_chain.as_ref() == Some(&chain.chain_id),
            active_proposals: snapshot.activity.get(&chain.chain_id).copied(),
            activity_error: snapshot.activity_errors.get(&chain.chain_id).cloned(),
            address: snapshot.addresses.get(&chain.chain_id).cloned(),
        })
        .collect();
    Json(ChainsResponse {
        active_chain: snapshot.active_chain,
        chains,
    })
}

#[derive(Debug, Deserialize)]
pub struct SelectChainRequest {
    pub chain_id: String,
}

pub async fn select_chain(
    State(state): State<Arc<RpcState>>,
    Json(req): Json<SelectChainRequest>,
) -> Result<Json<RefreshResponse>, RpcError> {
    if req.chain_id.trim().is_empty() {
        return Err(RpcError::InvalidRequest("chain_id is empty".into()));
    }
    let chain_id = ChainId::new(req.chain_id.trim());
    info!(chain = %chain_id, "chain switch requested");
    let refresh = state.aggregator.select_chain(&chain_id).await?;
    Ok(Json(refresh.into()))
}

// ── Proposals ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalView {
    pub id: ProposalId,
    pub title: String,
    pub status: String,
    pub voting_start_time: Option<DateTime<Utc>>,
    pub voting_end_time: Option<DateTime<Utc>>,
    pub seconds_remaining: Option<i64>,
    pub tally: Option<TallyResult>,
    pub percentages: Option<VotePercentages>,
    /// The bound account's vote as displayed; `None` until queried.
    pub vote: Option<VoteStatus>,
}

impl ProposalView {
    fn new(proposal: &Proposal, vote: Option<&VoteStatus>, now: DateTime<Utc>) -> Self {
        Self {
            id: proposal.id.clone(),
            title: proposal.title.clone(),
            status: proposal.status.clone(),
            voting_start_time: proposal.voting_start_time,
            voting_end_time: proposal.voting_end_time,
            seconds_remaining: proposal.seconds_remaining(now),
            tally: proposal.tally.clone(),
            percentages: proposal.percentages(),
            vote: vote.map(VoteStatus::displayed),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalsResponse {
    pub chain_id: Option<ChainId>,
    pub loading: bool,
    pub fetch_error: Option<String>,
    pub proposals: Vec<ProposalView>,
}

impl From<CacheSnapshot> for ProposalsResponse {
    fn from(snapshot: CacheSnapshot) -> Self {
        let now = Utc::now();
        let proposals = snapshot
            .proposals
            .iter()
            .map(|p| ProposalView::new(p, snapshot.votes.get(&p.id), now))
            .collect();
        Self {
            chain_id: snapshot.active_chain,
            loading: snapshot.loading,
            fetch_error: snapshot.fetch_error,
            proposals,
        }
    }
}

pub async fn list_proposals(State(state): State<Arc<RpcState>>) -> Json<ProposalsResponse> {
    Json(state.aggregator.snapshot().await.into())
}

// ── Refresh ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub chain_id: ChainId,
    /// `false` when the active chain changed before the result arrived.
    pub applied: bool,
    pub proposals: usize,
    pub tally_failures: Vec<String>,
    pub votes: usize,
}

impl From<Refresh> for RefreshResponse {
    fn from(refresh: Refresh) -> Self {
        match refresh {
            Refresh::Applied {
                chain_id,
                proposals,
                tally_failures,
                votes,
            } => Self {
                chain_id,
                applied: true,
                proposals,
                tally_failures: tally_failures.iter().map(ToString::to_string).collect(),
                votes,
            },
            Refresh::Stale { chain_id } => Self {
                chain_id,
                applied: false,
                proposals: 0,
                tally_failures: Vec::new(),
                votes: 0,
            },
        }
    }
}

pub async fn refresh(
    State(state): State<Arc<RpcState>>,
) -> Result<Json<RefreshResponse>, RpcError> {
    let refresh = state.aggregator.refresh_proposals().await?;
    Ok(Json(refresh.into()))
}

// ── Snapshot & metrics ───────────────────────────────────────────────────

pub async fn snapshot(State(state): State<Arc<RpcState>>) -> Json<CacheSnapshot> {
    Json(state.aggregator.snapshot().await)
}

pub async fn metrics(State(state): State<Arc<RpcState>>) -> Result<Response, RpcError> {
    if !state.enable_metrics {
        return Err(RpcError::MetricsDisabled);
    }
    let body = state
        .aggregator
        .metrics()
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
