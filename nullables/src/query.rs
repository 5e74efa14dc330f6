//! Nullable gateway — scripted governance query answers.

use async_trait::async_trait;
use govhub_client::{ClientError, GovQuery, NO_VOTE_STATUS};
use govhub_types::{
    Address, ChainDescriptor, ChainId, Proposal, ProposalId, TallyResult, VoteRecord,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// One recorded query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryCall {
    Proposals(ChainId),
    Count(ChainId),
    Tally(ChainId, ProposalId),
    Vote(ChainId, ProposalId, Address),
}

type VoteKey = (ChainId, ProposalId, Address);

/// A [`GovQuery`] that answers from scripted tables.
///
/// Unscripted lookups answer like an empty chain: no proposals, a count of
/// zero, a 404 for tallies and the "no vote" status for votes.
pub struct NullGovQuery {
    proposals: Mutex<HashMap<ChainId, Result<Vec<Proposal>, ClientError>>>,
    counts: Mutex<HashMap<ChainId, Result<usize, ClientError>>>,
    tallies: Mutex<HashMap<(ChainId, ProposalId), Result<TallyResult, ClientError>>>,
    votes: Mutex<HashMap<VoteKey, Result<Option<VoteRecord>, ClientError>>>,
    holds: Mutex<HashMap<ChainId, oneshot::Receiver<()>>>,
    tally_holds: Mutex<HashMap<(ChainId, ProposalId), oneshot::Receiver<()>>>,
    calls: Mutex<Vec<QueryCall>>,
}

impl NullGovQuery {
    pub fn new() -> Self {
        Self {
            proposals: Mutex::new(HashMap::new()),
            counts: Mutex::new(HashMap::new()),
            tallies: Mutex::new(HashMap::new()),
            votes: Mutex::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
            tally_holds: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_proposals(&self, chain: &str, proposals: Vec<Proposal>) {
        self.proposals
            .lock()
            .unwrap()
            .insert(ChainId::from(chain), Ok(proposals));
    }

    pub fn fail_proposals(&self, chain: &str, error: ClientError) {
        self.proposals
            .lock()
            .unwrap()
            .insert(ChainId::from(chain), Err(error));
    }

    /// Override the count; otherwise it follows the scripted proposal list.
    pub fn set_count(&self, chain: &str, count: usize) {
        self.counts
            .lock()
            .unwrap()
            .insert(ChainId::from(chain), Ok(count));
    }

    pub fn fail_count(&self, chain: &str, error: ClientError) {
        self.counts
            .lock()
            .unwrap()
            .insert(ChainId::from(chain), Err(error));
    }

    pub fn set_tally(&self, chain: &str, proposal: &str, tally: TallyResult) {
        self.tallies
            .lock()
            .unwrap()
            .insert((ChainId::from(chain), ProposalId::from(proposal)), Ok(tally));
    }

    pub fn fail_tally(&self, chain: &str, proposal: &str, error: ClientError) {
        self.tallies
            .lock()
            .unwrap()
            .insert((ChainId::from(chain), ProposalId::from(proposal)), Err(error));
    }

    pub fn set_vote(&self, chain: &str, proposal: &str, voter: &str, record: VoteRecord) {
        self.votes
            .lock()
            .unwrap()
            .insert(vote_key(chain, proposal, voter), Ok(Some(record)));
    }

    pub fn fail_vote(&self, chain: &str, proposal: &str, voter: &str, error: ClientError) {
        self.votes
            .lock()
            .unwrap()
            .insert(vote_key(chain, proposal, voter), Err(error));
    }

    /// Keep the next proposal-list request for `chain` pending until the
    /// returned sender fires (or is dropped).
    pub fn hold_proposals(&self, chain: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(ChainId::from(chain), rx);
        tx
    }

    /// Like [`hold_proposals`](Self::hold_proposals), for one proposal's tally.
    pub fn hold_tally(&self, chain: &str, proposal: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.tally_holds
            .lock()
            .unwrap()
            .insert((ChainId::from(chain), ProposalId::from(proposal)), rx);
        tx
    }

    /// All queries received so far, in arrival order.
    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn vote_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, QueryCall::Vote(..)))
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: QueryCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted_proposals(&self, chain_id: &ChainId) -> Result<Vec<Proposal>, ClientError> {
        self.proposals
            .lock()
            .unwrap()
            .get(chain_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl Default for NullGovQuery {
    fn default() -> Self {
        Self::new()
    }
}

fn vote_key(chain: &str, proposal: &str, voter: &str) -> VoteKey {
    (
        ChainId::from(chain),
        ProposalId::from(proposal),
        Address::from(voter),
    )
}

#[async_trait]
impl GovQuery for NullGovQuery {
    async fn voting_proposals(&self, chain: &ChainDescriptor) -> Result<Vec<Proposal>, ClientError> {
        self.record(QueryCall::Proposals(chain.chain_id.clone()));
        let hold = self.holds.lock().unwrap().remove(&chain.chain_id);
        if let Some(released) = hold {
            let _ = released.await;
        }
        self.scripted_proposals(&chain.chain_id)
    }

    async fn voting_proposal_count(&self, chain: &ChainDescriptor) -> Result<usize, ClientError> {
        self.record(QueryCall::Count(chain.chain_id.clone()));
        let scripted = self.counts.lock().unwrap().get(&chain.chain_id).cloned();
        match scripted {
            Some(result) => result,
            None => self.scripted_proposals(&chain.chain_id).map(|p| p.len()),
        }
    }

    async fn tally(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
    ) -> Result<TallyResult, ClientError> {
        self.record(QueryCall::Tally(chain.chain_id.clone(), proposal_id.clone()));
        let hold = self
            .tally_holds
            .lock()
            .unwrap()
            .remove(&(chain.chain_id.clone(), proposal_id.clone()));
        if let Some(released) = hold {
            let _ = released.await;
        }
        self.tallies
            .lock()
            .unwrap()
            .get(&(chain.chain_id.clone(), proposal_id.clone()))
            .cloned()
            .unwrap_or_else(|| {
                Err(ClientError::Status {
                    status: 404,
                    body: "tally not scripted".into(),
                })
            })
    }

    async fn vote(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, ClientError> {
        let key = (chain.chain_id.clone(), proposal_id.clone(), voter.clone());
        self.record(QueryCall::Vote(key.0.clone(), key.1.clone(), key.2.clone()));
        self.votes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| {
                Err(ClientError::Status {
                    status: NO_VOTE_STATUS,
                    body: "vote not found".into(),
                })
            })
    }
}
