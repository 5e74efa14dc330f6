use govhub_types::ChainId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("chain {0} is not registered")]
    NotFound(ChainId),

    #[error("chain {0} is registered more than once")]
    DuplicateChain(ChainId),

    #[error("chain registry must contain at least one chain")]
    Empty,
}
