//! Governance proposals as seen from one chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tally::{TallyResult, VotePercentages};

/// Proposal id. Unique within a chain only.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProposalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A proposal currently in its voting period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub voting_start_time: Option<DateTime<Utc>>,
    pub voting_end_time: Option<DateTime<Utc>>,
    /// Status name as reported by the chain (e.g. `PROPOSAL_STATUS_VOTING_PERIOD`).
    pub status: String,
    /// Attached after the base fetch; `None` when the tally could not be fetched.
    pub tally: Option<TallyResult>,
}

impl Proposal {
    pub fn with_tally(mut self, tally: TallyResult) -> Self {
        self.tally = Some(tally);
        self
    }

    pub fn percentages(&self) -> Option<VotePercentages> {
        self.tally.as_ref().and_then(TallyResult::percentages)
    }

    /// Seconds left in the voting period at `now`, zero once it has ended.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.voting_end_time
            .map(|end| (end - now).num_seconds().max(0))
    }
}
