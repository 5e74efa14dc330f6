//! Vote message and fee handed to a signer, and what it reports back.

use serde::{Deserialize, Serialize};

use crate::{Address, ProposalId, VoteOption};

/// Fee amount attached to every vote, in the chain's smallest denomination.
pub const VOTE_FEE_AMOUNT: &str = "1000";

/// Gas limit attached to every vote.
pub const VOTE_GAS_LIMIT: &str = "200000";

/// A governance vote message (`type: "vote"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "vote")]
pub struct VoteMsg {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub option: VoteOption,
}

/// Transaction fee. Fixed per chain; no estimation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub denom: String,
    pub amount: String,
    pub gas: String,
}

impl Fee {
    pub fn fixed(denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: VOTE_FEE_AMOUNT.to_string(),
            gas: VOTE_GAS_LIMIT.to_string(),
        }
    }
}

/// Outcome of a sign-and-broadcast call that reached the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// `0` means the chain accepted the transaction.
    pub code: u32,
    pub raw_log: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

impl BroadcastResult {
    pub fn accepted(&self) -> bool {
        self.code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fee_uses_chain_denom() {
        let fee = Fee::fixed("uatom");
        assert_eq!(fee.denom, "uatom");
        assert_eq!(fee.amount, "1000");
        assert_eq!(fee.gas, "200000");
    }

    #[test]
    fn vote_msg_is_tagged_as_vote() {
        let msg = VoteMsg {
            proposal_id: ProposalId::from("42"),
            voter: Address::from("cosmos1abc"),
            option: VoteOption::Yes,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "vote");
        assert_eq!(json["option"], "VOTE_OPTION_YES");
    }
}
