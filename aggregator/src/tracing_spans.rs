//! Pre-built [`tracing::Span`] constructors for aggregator operations.
//!
//! Consistent span names and fields make it possible to follow one chain's
//! fan-out across interleaved log lines.

use tracing::{debug_span, info_span, Span};

/// Span covering one proposal-list fetch including its tally fan-out.
pub fn chain_fetch_span(chain_id: &str) -> Span {
    info_span!("chain_fetch", chain = %chain_id)
}

/// Span covering a single tally request.
pub fn tally_span(proposal_id: &str) -> Span {
    debug_span!("tally", proposal = %proposal_id)
}

/// Span covering a single vote-status query.
pub fn vote_query_span(chain_id: &str, proposal_id: &str) -> Span {
    debug_span!("vote_query", chain = %chain_id, proposal = %proposal_id)
}

/// Span covering wallet binding for one chain.
pub fn bind_span(chain_id: &str) -> Span {
    debug_span!("bind", chain = %chain_id)
}

/// Span covering one vote submission from precondition checks to outcome.
pub fn submit_span(chain_id: &str, proposal_id: &str) -> Span {
    info_span!("submit_vote", chain = %chain_id, proposal = %proposal_id)
}

/// Span covering one activity-count sweep.
pub fn activity_tick_span(chain_count: usize) -> Span {
    info_span!("activity_tick", chains = %chain_count)
}
