//! Nullable signer — scripted authorization and broadcast outcomes.

use async_trait::async_trait;
use govhub_client::{Signer, SignerError};
use govhub_types::{Address, BroadcastResult, ChainDescriptor, ChainId, Fee, VoteMsg};
use std::collections::HashMap;
use std::sync::Mutex;

/// What the next `sign_and_broadcast` call reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Code 0 with the given tx hash.
    Accept { tx_hash: String },
    /// Non-zero code with the chain's log.
    Reject { code: u32, raw_log: String },
    /// The call itself errors.
    Fail(String),
}

/// A broadcast the signer was asked to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedBroadcast {
    pub chain_id: ChainId,
    pub signer: Address,
    pub msgs: Vec<VoteMsg>,
    pub fee: Fee,
}

/// A [`Signer`] with per-chain accounts and scripted broadcast results.
pub struct NullSigner {
    accounts: Mutex<HashMap<ChainId, Address>>,
    rejected: Mutex<HashMap<ChainId, String>>,
    outcome: Mutex<BroadcastOutcome>,
    enabled: Mutex<Vec<ChainId>>,
    broadcasts: Mutex<Vec<RecordedBroadcast>>,
}

impl NullSigner {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            rejected: Mutex::new(HashMap::new()),
            outcome: Mutex::new(BroadcastOutcome::Accept {
                tx_hash: "NULLTX".to_string(),
            }),
            enabled: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Give the signer an account on `chain`.
    pub fn with_account(self, chain: &str, address: &str) -> Self {
        self.set_account(chain, address);
        self
    }

    pub fn set_account(&self, chain: &str, address: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(ChainId::from(chain), Address::from(address));
    }

    /// Make `enable` fail for `chain`.
    pub fn reject_chain(&self, chain: &str, reason: &str) {
        self.rejected
            .lock()
            .unwrap()
            .insert(ChainId::from(chain), reason.to_string());
    }

    pub fn set_outcome(&self, outcome: BroadcastOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Chains `enable` was called for, in call order.
    pub fn enabled_chains(&self) -> Vec<ChainId> {
        self.enabled.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<RecordedBroadcast> {
        self.broadcasts.lock().unwrap().clone()
    }
}

impl Default for NullSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Signer for NullSigner {
    async fn enable(&self, chain_id: &ChainId) -> Result<(), SignerError> {
        self.enabled.lock().unwrap().push(chain_id.clone());
        match self.rejected.lock().unwrap().get(chain_id) {
            Some(reason) => Err(SignerError::ChainRejected {
                chain_id: chain_id.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn get_account(&self, chain_id: &ChainId) -> Result<Address, SignerError> {
        self.accounts
            .lock()
            .unwrap()
            .get(chain_id)
            .cloned()
            .ok_or_else(|| SignerError::Account {
                chain_id: chain_id.clone(),
                reason: "no account".into(),
            })
    }

    async fn sign_and_broadcast(
        &self,
        chain: &ChainDescriptor,
        signer: &Address,
        msgs: &[VoteMsg],
        fee: &Fee,
    ) -> Result<BroadcastResult, SignerError> {
        self.broadcasts.lock().unwrap().push(RecordedBroadcast {
            chain_id: chain.chain_id.clone(),
            signer: signer.clone(),
            msgs: msgs.to_vec(),
            fee: fee.clone(),
        });
        match self.outcome.lock().unwrap().clone() {
            BroadcastOutcome::Accept { tx_hash } => Ok(BroadcastResult {
                code: 0,
                raw_log: String::new(),
                tx_hash: Some(tx_hash),
            }),
            BroadcastOutcome::Reject { code, raw_log } => Ok(BroadcastResult {
                code,
                raw_log,
                tx_hash: None,
            }),
            BroadcastOutcome::Fail(reason) => Err(SignerError::Broadcast(reason)),
        }
    }

    fn name(&self) -> &str {
        "null-signer"
    }
}
