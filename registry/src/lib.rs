//! Chain registry.
//!
//! An ordered, immutable list of [`ChainDescriptor`]s fixed at startup. Every
//! other component looks chains up here by [`ChainId`]; nothing mutates it.

pub mod builtin;
pub mod error;

pub use error::RegistryError;

use govhub_types::{ChainDescriptor, ChainId};
use std::collections::HashSet;

/// Ordered set of chains keyed by chain id.
#[derive(Clone, Debug)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    /// Build a registry, rejecting an empty list or duplicate chain ids.
    pub fn new(chains: Vec<ChainDescriptor>) -> Result<Self, RegistryError> {
        if chains.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for chain in &chains {
            if !seen.insert(chain.chain_id.clone()) {
                return Err(RegistryError::DuplicateChain(chain.chain_id.clone()));
            }
        }
        Ok(Self { chains })
    }

    /// The chains shipped with govhub.
    pub fn builtin() -> Self {
        Self {
            chains: builtin::builtin_chains(),
        }
    }

    /// All chains in registration order.
    pub fn list(&self) -> &[ChainDescriptor] {
        &self.chains
    }

    pub fn by_id(&self, chain_id: &ChainId) -> Result<&ChainDescriptor, RegistryError> {
        self.chains
            .iter()
            .find(|c| &c.chain_id == chain_id)
            .ok_or_else(|| RegistryError::NotFound(chain_id.clone()))
    }

    pub fn contains(&self, chain_id: &ChainId) -> bool {
        self.chains.iter().any(|c| &c.chain_id == chain_id)
    }

    /// The chain selected when nothing else has been chosen: the first one.
    pub fn default_chain(&self) -> &ChainDescriptor {
        // Construction guarantees at least one entry.
        &self.chains[0]
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
