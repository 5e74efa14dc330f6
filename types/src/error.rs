//! Errors raised while building data-model values from wire text.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid {field} count: {value:?} is not a non-negative decimal integer")]
    InvalidCount { field: &'static str, value: String },

    #[error("unknown vote option: {0}")]
    UnknownVoteOption(String),
}
