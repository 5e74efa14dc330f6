//! Chain identity and descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain id as registered on the network (e.g. `cosmoshub-4`).
///
/// The unique key of every per-chain map in the workspace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Static description of one governance-capable chain.
///
/// Defined at startup and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    /// Registry slug (e.g. `cosmos`, `osmosis`).
    pub chain_name: String,
    /// Base URL of the chain's REST (LCD) gateway.
    pub rest_endpoint: String,
    /// Base URL of the chain's Tendermint RPC, used by signers to broadcast.
    pub rpc_endpoint: String,
    /// Fee denomination (e.g. `uatom`).
    pub denom: String,
    pub display_name: String,
}

impl ChainDescriptor {
    /// REST base URL without a trailing slash, ready for path concatenation.
    pub fn rest_base(&self) -> &str {
        self.rest_endpoint.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_base_strips_trailing_slashes() {
        let chain = ChainDescriptor {
            chain_id: ChainId::from("test-1"),
            chain_name: "test".into(),
            rest_endpoint: "https://rest.example.com/test//".into(),
            rpc_endpoint: "https://rpc.example.com/test".into(),
            denom: "utest".into(),
            display_name: "Test".into(),
        };
        assert_eq!(chain.rest_base(), "https://rest.example.com/test");
    }

    #[test]
    fn chain_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ChainId::from("osmosis-1")).unwrap();
        assert_eq!(json, "\"osmosis-1\"");
    }
}
