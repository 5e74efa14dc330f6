//! Small constructors for test data.

use govhub_types::{ChainDescriptor, ChainId, Proposal, ProposalId};

/// A chain with predictable endpoints and denom `u<id>`.
pub fn chain(id: &str) -> ChainDescriptor {
    ChainDescriptor {
        chain_id: ChainId::from(id),
        chain_name: id.to_string(),
        rest_endpoint: format!("http://rest.test/{id}"),
        rpc_endpoint: format!("http://rpc.test/{id}"),
        denom: format!("u{id}"),
        display_name: id.to_uppercase(),
    }
}

/// A voting-period proposal without a tally.
pub fn proposal(id: &str) -> Proposal {
    Proposal {
        id: ProposalId::from(id),
        title: format!("Proposal {id}"),
        voting_start_time: None,
        voting_end_time: None,
        status: "PROPOSAL_STATUS_VOTING_PERIOD".to_string(),
        tally: None,
    }
}
