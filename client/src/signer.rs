//! Signing capability contract.
//!
//! The core never holds keys. Whatever does (a browser extension bridge, a
//! hardware wallet daemon, a test double) implements [`Signer`].

use async_trait::async_trait;
use govhub_types::{Address, BroadcastResult, ChainDescriptor, ChainId, Fee, VoteMsg};
use std::collections::HashMap;

use crate::error::SignerError;

/// An external capability able to authorize chains and sign on their behalf.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Authorize use of `chain_id`. May fail for one chain and succeed for others.
    async fn enable(&self, chain_id: &ChainId) -> Result<(), SignerError>;

    /// Default account on an enabled chain.
    async fn get_account(&self, chain_id: &ChainId) -> Result<Address, SignerError>;

    /// Sign `msgs` as `signer` and broadcast them to `chain` in one step.
    ///
    /// `Ok` means the chain answered; inspect [`BroadcastResult::code`] for
    /// acceptance.
    async fn sign_and_broadcast(
        &self,
        chain: &ChainDescriptor,
        signer: &Address,
        msgs: &[VoteMsg],
        fee: &Fee,
    ) -> Result<BroadcastResult, SignerError>;

    /// Human-readable name of this signer.
    fn name(&self) -> &str;
}

/// Binds fixed addresses for vote tracking and refuses to sign.
///
/// Lets a host follow an account's votes without any key material.
#[derive(Clone, Debug, Default)]
pub struct WatchOnlySigner {
    accounts: HashMap<ChainId, Address>,
}

impl WatchOnlySigner {
    pub fn new(accounts: HashMap<ChainId, Address>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl Signer for WatchOnlySigner {
    async fn enable(&self, chain_id: &ChainId) -> Result<(), SignerError> {
        if self.accounts.contains_key(chain_id) {
            Ok(())
        } else {
            Err(SignerError::ChainRejected {
                chain_id: chain_id.clone(),
                reason: "no watch address configured".into(),
            })
        }
    }

    async fn get_account(&self, chain_id: &ChainId) -> Result<Address, SignerError> {
        self.accounts
            .get(chain_id)
            .cloned()
            .ok_or_else(|| SignerError::Account {
                chain_id: chain_id.clone(),
                reason: "no watch address configured".into(),
            })
    }

    async fn sign_and_broadcast(
        &self,
        _chain: &ChainDescriptor,
        _signer: &Address,
        _msgs: &[VoteMsg],
        _fee: &Fee,
    ) -> Result<BroadcastResult, SignerError> {
        Err(SignerError::Unsupported("signing with a watch-only signer".into()))
    }

    fn name(&self) -> &str {
        "watch-only"
    }
}
