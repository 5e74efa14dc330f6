//! Vote options, vote records and the per-proposal vote slot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// A governance vote option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoteOption {
    /// No choice; never valid in a submitted vote.
    Unspecified,
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

/// The one mapping between an option, its numeric code in a vote
/// transaction, and its name in query responses.
pub const VOTE_OPTIONS: [(VoteOption, i32, &str); 5] = [
    (VoteOption::Unspecified, 0, "VOTE_OPTION_UNSPECIFIED"),
    (VoteOption::Yes, 1, "VOTE_OPTION_YES"),
    (VoteOption::Abstain, 2, "VOTE_OPTION_ABSTAIN"),
    (VoteOption::No, 3, "VOTE_OPTION_NO"),
    (VoteOption::NoWithVeto, 4, "VOTE_OPTION_NO_WITH_VETO"),
];

/// Weight of a single-option vote as the chain reports it.
pub const FULL_WEIGHT: &str = "1.000000000000000000";

impl VoteOption {
    fn entry(self) -> (VoteOption, i32, &'static str) {
        // Rows are in declaration order.
        VOTE_OPTIONS[self as usize]
    }

    /// Numeric code used in the vote message.
    pub fn code(self) -> i32 {
        self.entry().1
    }

    pub fn from_code(code: i32) -> Result<Self, TypesError> {
        VOTE_OPTIONS
            .into_iter()
            .find(|(_, c, _)| *c == code)
            .map(|(option, _, _)| option)
            .ok_or_else(|| TypesError::UnknownVoteOption(code.to_string()))
    }

    /// Name used by the query API (`VOTE_OPTION_YES`, …).
    pub fn as_str_name(self) -> &'static str {
        self.entry().2
    }

    pub fn from_str_name(name: &str) -> Result<Self, TypesError> {
        VOTE_OPTIONS
            .into_iter()
            .find(|(_, _, n)| *n == name)
            .map(|(option, _, _)| option)
            .ok_or_else(|| TypesError::UnknownVoteOption(name.to_string()))
    }

    /// Whether this option may be cast in a vote transaction.
    pub fn is_castable(self) -> bool {
        self != VoteOption::Unspecified
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

impl Serialize for VoteOption {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str_name())
    }
}

impl<'de> Deserialize<'de> for VoteOption {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Self::from_str_name(&name).map_err(serde::de::Error::custom)
    }
}

/// An account's recorded vote on a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub option: VoteOption,
    /// Decimal weight string as reported by the chain.
    pub weight: String,
}

impl VoteRecord {
    /// A single-option vote carrying the whole voting power.
    pub fn full(option: VoteOption) -> Self {
        Self {
            option,
            weight: FULL_WEIGHT.to_string(),
        }
    }
}

/// Result of looking up an account's vote on a proposal.
///
/// "Not yet queried" has no variant: it is the absence of a cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VoteStatus {
    Present { record: VoteRecord },
    /// The chain confirmed the account has not voted.
    Absent,
    /// The lookup failed; whether the account voted is not known.
    QueryFailed { reason: String },
}

impl VoteStatus {
    pub fn present(record: VoteRecord) -> Self {
        Self::Present { record }
    }

    pub fn record(&self) -> Option<&VoteRecord> {
        match self {
            Self::Present { record } => Some(record),
            _ => None,
        }
    }

    /// What a user sees: a failed lookup renders as "not voted".
    pub fn displayed(&self) -> VoteStatus {
        match self {
            Self::QueryFailed { .. } => Self::Absent,
            other => other.clone(),
        }
    }

    pub fn is_confirmed_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::QueryFailed { .. })
    }
}
