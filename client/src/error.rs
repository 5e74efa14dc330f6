use govhub_types::ChainId;
use thiserror::Error;

/// Failure of a read request against a chain's REST gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("failed to create HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// HTTP status if the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by a signer capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signer rejected chain {chain_id}: {reason}")]
    ChainRejected { chain_id: ChainId, reason: String },

    #[error("no account available on chain {chain_id}: {reason}")]
    Account { chain_id: ChainId, reason: String },

    #[error("sign and broadcast failed: {0}")]
    Broadcast(String),

    #[error("signer does not support {0}")]
    Unsupported(String),
}
