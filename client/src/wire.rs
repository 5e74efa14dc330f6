//! JSON shapes returned by the governance REST gateway.
//!
//! Accepts both the `v1` and `v1beta1` layouts where they differ only in
//! field names, so the API prefix can be switched per deployment.

use chrono::{DateTime, Utc};
use govhub_types::{Proposal, ProposalId, TallyResult, TypesError, VoteOption, VoteRecord};
use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
pub struct ProposalsResponse {
    #[serde(default)]
    pub proposals: Vec<ProposalWire>,
    #[serde(default)]
    pub pagination: Option<PaginationWire>,
}

impl ProposalsResponse {
    /// The gateway's total count, if it honoured `count_total`.
    ///
    /// A total of zero next to a non-empty page means the count was not
    /// computed.
    pub fn counted_total(&self) -> Option<usize> {
        match self.pagination.as_ref().and_then(PaginationWire::total) {
            Some(0) if !self.proposals.is_empty() => None,
            total => total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaginationWire {
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
}

impl PaginationWire {
    /// `total` is only meaningful when the request asked for it.
    pub fn total(&self) -> Option<usize> {
        self.total.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProposalWire {
    #[serde(alias = "proposal_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// `v1beta1` nests the title in the proposal content.
    #[serde(default)]
    pub content: Option<ContentWire>,
    #[serde(default)]
    pub voting_start_time: Option<String>,
    #[serde(default)]
    pub voting_end_time: Option<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentWire {
    #[serde(default)]
    pub title: String,
}

impl ProposalWire {
    pub fn into_proposal(self) -> Proposal {
        let title = if self.title.is_empty() {
            self.content.map(|c| c.title).unwrap_or_default()
        } else {
            self.title
        };
        Proposal {
            id: ProposalId::from(self.id),
            title,
            voting_start_time: parse_time(self.voting_start_time.as_deref()),
            voting_end_time: parse_time(self.voting_end_time.as_deref()),
            status: self.status,
            tally: None,
        }
    }
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
pub struct TallyResponse {
    pub tally: TallyWire,
}

#[derive(Debug, Deserialize)]
pub struct TallyWire {
    #[serde(alias = "yes")]
    pub yes_count: String,
    #[serde(alias = "no")]
    pub no_count: String,
    #[serde(alias = "abstain")]
    pub abstain_count: String,
    #[serde(alias = "no_with_veto")]
    pub no_with_veto_count: String,
}

impl TryFrom<TallyWire> for TallyResult {
    type Error = ClientError;

    fn try_from(wire: TallyWire) -> Result<Self, Self::Error> {
        TallyResult::from_decimal_strings(
            &wire.yes_count,
            &wire.no_count,
            &wire.abstain_count,
            &wire.no_with_veto_count,
        )
        .map_err(decode_error)
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteResponse {
    pub vote: VoteWire,
}

#[derive(Debug, Deserialize)]
pub struct VoteWire {
    #[serde(default)]
    pub options: Vec<WeightedOptionWire>,
    /// Deprecated single-option field still filled by older gateways.
    #[serde(default)]
    pub option: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeightedOptionWire {
    pub option: String,
    pub weight: String,
}

impl VoteWire {
    /// The first weighted option, falling back to the deprecated field.
    ///
    /// An unspecified option is no record.
    pub fn into_record(self) -> Result<Option<VoteRecord>, ClientError> {
        if let Some(first) = self.options.into_iter().next() {
            return match VoteOption::from_str_name(&first.option).map_err(decode_error)? {
                VoteOption::Unspecified => Ok(None),
                option => Ok(Some(VoteRecord {
                    option,
                    weight: first.weight,
                })),
            };
        }
        match self.option.as_deref() {
            None => Ok(None),
            Some(name) => match VoteOption::from_str_name(name).map_err(decode_error)? {
                VoteOption::Unspecified => Ok(None),
                option => Ok(Some(VoteRecord::full(option))),
            },
        }
    }
}

fn decode_error(e: TypesError) -> ClientError {
    ClientError::Decode(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_v1_proposal_list() {
        let json = r#"{
            "proposals": [{
                "id": "912",
                "title": "Upgrade to v19",
                "status": "PROPOSAL_STATUS_VOTING_PERIOD",
                "voting_start_time": "2026-10-10T12:00:00.123456Z",
                "voting_end_time": "2026-10-24T12:00:00Z",
                "final_tally_result": {"yes_count": "0", "no_count": "0", "abstain_count": "0", "no_with_veto_count": "0"}
            }],
            "pagination": {"next_key": null, "total": "1"}
        }"#;
        let resp: ProposalsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.pagination.as_ref().and_then(PaginationWire::total), Some(1));
        let proposal = resp.proposals.into_iter().next().unwrap().into_proposal();
        assert_eq!(proposal.id.as_str(), "912");
        assert_eq!(proposal.title, "Upgrade to v19");
        assert!(proposal.voting_start_time.is_some());
        assert!(proposal.tally.is_none());
    }

    #[test]
    fn decodes_v1beta1_proposal_title_from_content() {
        let json = r#"{"proposals": [{"proposal_id": "3", "content": {"title": "Legacy"}, "status": "PROPOSAL_STATUS_VOTING_PERIOD"}]}"#;
        let resp: ProposalsResponse = serde_json::from_str(json).unwrap();
        let proposal = resp.proposals.into_iter().next().unwrap().into_proposal();
        assert_eq!(proposal.id.as_str(), "3");
        assert_eq!(proposal.title, "Legacy");
        assert!(proposal.voting_end_time.is_none());
    }

    #[test]
    fn zero_total_with_proposals_is_not_a_count() {
        let json = r#"{"proposals": [{"id": "4"}], "pagination": {"total": "0"}}"#;
        let resp: ProposalsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.counted_total(), None);

        let json = r#"{"proposals": [], "pagination": {"total": "0"}}"#;
        let resp: ProposalsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.counted_total(), Some(0));

        let json = r#"{"proposals": [{"id": "4"}], "pagination": {"total": "12"}}"#;
        let resp: ProposalsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.counted_total(), Some(12));
    }

    #[test]
    fn missing_proposals_field_is_empty_list() {
        let resp: ProposalsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.proposals.is_empty());
    }

    #[test]
    fn decodes_tally_counts() {
        let json = r#"{"tally": {"yes_count": "70", "no_count": "30", "abstain_count": "0", "no_with_veto_count": "0"}}"#;
        let resp: TallyResponse = serde_json::from_str(json).unwrap();
        let tally = TallyResult::try_from(resp.tally).unwrap();
        assert_eq!(tally, TallyResult::new(70u32, 30u32, 0u32, 0u32));
    }

    #[test]
    fn malformed_tally_is_decode_error() {
        let json = r#"{"tally": {"yes_count": "lots", "no_count": "0", "abstain_count": "0", "no_with_veto_count": "0"}}"#;
        let resp: TallyResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(TallyResult::try_from(resp.tally), Err(ClientError::Decode(_))));
    }

    #[test]
    fn vote_takes_first_weighted_option() {
        let json = r#"{"vote": {"proposal_id": "1", "voter": "cosmos1x", "options": [
            {"option": "VOTE_OPTION_NO", "weight": "0.700000000000000000"},
            {"option": "VOTE_OPTION_YES", "weight": "0.300000000000000000"}
        ]}}"#;
        let resp: VoteResponse = serde_json::from_str(json).unwrap();
        let record = resp.vote.into_record().unwrap().unwrap();
        assert_eq!(record.option, VoteOption::No);
        assert_eq!(record.weight, "0.700000000000000000");
    }

    #[test]
    fn empty_options_is_no_record() {
        let resp: VoteResponse = serde_json::from_str(r#"{"vote": {"options": []}}"#).unwrap();
        assert_eq!(resp.vote.into_record().unwrap(), None);
    }

    #[test]
    fn unspecified_first_option_is_no_record() {
        let json = r#"{"vote": {"options": [
            {"option": "VOTE_OPTION_UNSPECIFIED", "weight": "1.000000000000000000"}
        ]}}"#;
        let resp: VoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.vote.into_record().unwrap(), None);
    }

    #[test]
    fn legacy_option_field_is_honoured() {
        let resp: VoteResponse =
            serde_json::from_str(r#"{"vote": {"option": "VOTE_OPTION_ABSTAIN"}}"#).unwrap();
        let record = resp.vote.into_record().unwrap().unwrap();
        assert_eq!(record, VoteRecord::full(VoteOption::Abstain));
    }
}
