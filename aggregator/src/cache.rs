//! Process-wide aggregation state.
//!
//! [`AggregationCache`] is the single source of truth the presentation layer
//! reads. Every write replaces one key's value wholesale, and no lock is held
//! across a network call: callers fetch first, then write.
//!
//! Chain switches are guarded by a generation counter. Starting a fetch hands
//! out a [`ChainTicket`]; a result stored with a ticket that is no longer
//! current is dropped, so a slow response for a previous chain can never
//! overwrite the view of the chain that replaced it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use govhub_types::{Address, ChainId, Proposal, ProposalId, VoteStatus};

/// Proof that a fetch was started for a specific active-chain generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainTicket {
    pub chain_id: ChainId,
    pub generation: u64,
}

#[derive(Default)]
struct CacheState {
    active_chain: Option<ChainId>,
    generation: u64,
    loading: bool,
    proposals: HashMap<ChainId, Arc<Vec<Proposal>>>,
    fetch_errors: HashMap<ChainId, String>,
    addresses: HashMap<ChainId, Address>,
    activity: HashMap<ChainId, usize>,
    activity_errors: HashMap<ChainId, String>,
    activity_updated_at: Option<DateTime<Utc>>,
    votes: HashMap<(ChainId, ProposalId), VoteStatus>,
}

impl CacheState {
    fn is_current(&self, ticket: &ChainTicket) -> bool {
        self.generation == ticket.generation
            && self.active_chain.as_ref() == Some(&ticket.chain_id)
    }

    fn next_ticket(&mut self, chain_id: ChainId) -> ChainTicket {
        self.generation += 1;
        ChainTicket {
            chain_id,
            generation: self.generation,
        }
    }
}

/// Owned copy of the cache for readers.
///
/// Proposals and votes are those of the active chain.
#[derive(Clone, Debug, Serialize)]
pub struct CacheSnapshot {
    pub active_chain: Option<ChainId>,
    pub generation: u64,
    pub loading: bool,
    pub proposals: Vec<Proposal>,
    pub fetch_error: Option<String>,
    pub addresses: BTreeMap<ChainId, Address>,
    pub activity: BTreeMap<ChainId, usize>,
    pub activity_errors: BTreeMap<ChainId, String>,
    pub activity_updated_at: Option<DateTime<Utc>>,
    pub votes: BTreeMap<ProposalId, VoteStatus>,
}

#[derive(Default)]
pub struct AggregationCache {
    state: RwLock<CacheState>,
}

impl AggregationCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Active chain and proposals ──────────────────────────────────────

    /// Make `chain_id` the active chain and invalidate every outstanding ticket.
    ///
    /// The returned ticket is the one the follow-up fetch must store with;
    /// the view is marked loading until it does.
    pub async fn set_active_chain(&self, chain_id: ChainId) -> ChainTicket {
        let mut state = self.state.write().await;
        state.active_chain = Some(chain_id.clone());
        state.loading = true;
        state.next_ticket(chain_id)
    }

    /// Start a fetch for the active chain. Supersedes any fetch already in flight.
    ///
    /// Returns `None` when no chain is active.
    pub async fn begin_fetch(&self) -> Option<ChainTicket> {
        let mut state = self.state.write().await;
        let chain_id = state.active_chain.clone()?;
        state.loading = true;
        Some(state.next_ticket(chain_id))
    }

    /// Store a fetch result. A failed fetch stores an empty list plus the reason.
    ///
    /// Returns `false`, writing nothing, if the ticket is stale.
    pub async fn store_proposals(
        &self,
        ticket: &ChainTicket,
        result: Result<Vec<Proposal>, String>,
    ) -> bool {
        let mut state = self.state.write().await;
        if !state.is_current(ticket) {
            return false;
        }
        let chain_id = ticket.chain_id.clone();
        match result {
            Ok(proposals) => {
                state.fetch_errors.remove(&chain_id);
                state.proposals.insert(chain_id, Arc::new(proposals));
            }
            Err(reason) => {
                state.fetch_errors.insert(chain_id.clone(), reason);
                state.proposals.insert(chain_id, Arc::new(Vec::new()));
            }
        }
        state.loading = false;
        true
    }

    pub async fn is_current(&self, ticket: &ChainTicket) -> bool {
        self.state.read().await.is_current(ticket)
    }

    pub async fn active_chain(&self) -> Option<ChainId> {
        self.state.read().await.active_chain.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// The active chain's proposals; empty before the first fetch.
    pub async fn current_proposals(&self) -> Arc<Vec<Proposal>> {
        let state = self.state.read().await;
        state
            .active_chain
            .as_ref()
            .and_then(|id| state.proposals.get(id).cloned())
            .unwrap_or_default()
    }

    pub async fn proposals_for(&self, chain_id: &ChainId) -> Option<Arc<Vec<Proposal>>> {
        self.state.read().await.proposals.get(chain_id).cloned()
    }

    pub async fn fetch_error(&self, chain_id: &ChainId) -> Option<String> {
        self.state.read().await.fetch_errors.get(chain_id).cloned()
    }

    // ── Wallet bindings ─────────────────────────────────────────────────

    /// Bind `address` for one chain, leaving every other binding untouched.
    ///
    /// Votes cached for the chain are dropped when the address changes.
    /// Returns the previous binding.
    pub async fn bind_address(&self, chain_id: ChainId, address: Address) -> Option<Address> {
        let mut state = self.state.write().await;
        let previous = state.addresses.insert(chain_id.clone(), address.clone());
        if previous.as_ref().is_some_and(|prev| *prev != address) {
            state.votes.retain(|(chain, _), _| *chain != chain_id);
        }
        previous
    }

    pub async fn address(&self, chain_id: &ChainId) -> Option<Address> {
        self.state.read().await.addresses.get(chain_id).cloned()
    }

    pub async fn addresses(&self) -> HashMap<ChainId, Address> {
        self.state.read().await.addresses.clone()
    }

    // ── Activity ────────────────────────────────────────────────────────

    /// Replace the activity counts and failures from one sweep.
    pub async fn replace_activity(
        &self,
        counts: HashMap<ChainId, usize>,
        failures: HashMap<ChainId, String>,
    ) {
        let mut state = self.state.write().await;
        state.activity = counts;
        state.activity_errors = failures;
        state.activity_updated_at = Some(Utc::now());
    }

    pub async fn activity(&self) -> HashMap<ChainId, usize> {
        self.state.read().await.activity.clone()
    }

    pub async fn activity_errors(&self) -> HashMap<ChainId, String> {
        self.state.read().await.activity_errors.clone()
    }

    // ── Votes ───────────────────────────────────────────────────────────

    /// Overwrite a vote slot unconditionally.
    pub async fn set_vote(&self, chain_id: ChainId, proposal_id: ProposalId, status: VoteStatus) {
        self.state
            .write()
            .await
            .votes
            .insert((chain_id, proposal_id), status);
    }

    /// Write a queried vote only if `address` is still bound for the chain.
    pub async fn store_vote_if_bound(
        &self,
        chain_id: ChainId,
        proposal_id: ProposalId,
        address: &Address,
        status: VoteStatus,
    ) -> bool {
        let mut state = self.state.write().await;
        if state.addresses.get(&chain_id) != Some(address) {
            return false;
        }
        state.votes.insert((chain_id, proposal_id), status);
        true
    }

    /// `None` means the slot has not been queried.
    pub async fn vote(&self, chain_id: &ChainId, proposal_id: &ProposalId) -> Option<VoteStatus> {
        self.state
            .read()
            .await
            .votes
            .get(&(chain_id.clone(), proposal_id.clone()))
            .cloned()
    }

    pub async fn votes_for(&self, chain_id: &ChainId) -> HashMap<ProposalId, VoteStatus> {
        self.state
            .read()
            .await
            .votes
            .iter()
            .filter(|((chain, _), _)| chain == chain_id)
            .map(|((_, proposal), status)| (proposal.clone(), status.clone()))
            .collect()
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        let state = self.state.read().await;
        let active = state.active_chain.clone();
        let proposals = active
            .as_ref()
            .and_then(|id| state.proposals.get(id))
            .map(|list| list.as_ref().clone())
            .unwrap_or_default();
        let votes = state
            .votes
            .iter()
            .filter(|((chain, _), _)| Some(chain) == active.as_ref())
            .map(|((_, proposal), status)| (proposal.clone(), status.clone()))
            .collect();

        CacheSnapshot {
            fetch_error: active.as_ref().and_then(|id| state.fetch_errors.get(id).cloned()),
            active_chain: active,
            generation: state.generation,
            loading: state.loading,
            proposals,
            addresses: state.addresses.clone().into_iter().collect(),
            activity: state.activity.clone().into_iter().collect(),
            activity_errors: state.activity_errors.clone().into_iter().collect(),
            activity_updated_at: state.activity_updated_at,
            votes,
        }
    }
}
