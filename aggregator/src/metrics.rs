//! Prometheus metrics for the aggregator.
//!
//! [`AggregatorMetrics`] owns a dedicated [`Registry`] that the HTTP
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Submission outcome labels.
pub const OUTCOME_CONFIRMED: &str = "confirmed";
pub const OUTCOME_REJECTED: &str = "rejected";
pub const OUTCOME_FAILED: &str = "failed";

pub struct AggregatorMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Proposal-list fetches started.
    pub proposal_fetches: IntCounter,
    /// Proposal-list fetches whose top-level request failed.
    pub fetch_failures: IntCounter,
    /// Individual tally requests that failed.
    pub tally_failures: IntCounter,
    /// Vote-status queries issued.
    pub vote_queries: IntCounter,
    /// Vote-status queries that failed for a reason other than "no vote".
    pub vote_query_failures: IntCounter,
    /// Chains the signer failed to bind.
    pub binding_failures: IntCounter,
    /// Activity sweeps across all chains.
    pub activity_ticks: IntCounter,
    /// Results dropped because the active chain changed while they were in flight.
    pub stale_results_discarded: IntCounter,
    /// Vote submissions by outcome (`confirmed`, `rejected`, `failed`).
    pub submissions: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Proposals in the active chain's current view.
    pub active_proposals: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a proposal fetch including the tally fan-out.
    pub fetch_duration_ms: Histogram,
}

impl AggregatorMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let proposal_fetches = register_int_counter_with_registry!(
            Opts::new("govhub_proposal_fetches_total", "Proposal list fetches started"),
            registry
        )
        .expect("failed to register proposal_fetches counter");

        let fetch_failures = register_int_counter_with_registry!(
            Opts::new(
                "govhub_proposal_fetch_failures_total",
                "Proposal list fetches that failed"
            ),
            registry
        )
        .expect("failed to register fetch_failures counter");

        let tally_failures = register_int_counter_with_registry!(
            Opts::new("govhub_tally_failures_total", "Tally requests that failed"),
            registry
        )
        .expect("failed to register tally_failures counter");

        let vote_queries = register_int_counter_with_registry!(
            Opts::new("govhub_vote_queries_total", "Vote status queries issued"),
            registry
        )
        .expect("failed to register vote_queries counter");

        let vote_query_failures = register_int_counter_with_registry!(
            Opts::new(
                "govhub_vote_query_failures_total",
                "Vote status queries that could not determine the vote"
            ),
            registry
        )
        .expect("failed to register vote_query_failures counter");

        let binding_failures = register_int_counter_with_registry!(
            Opts::new(
                "govhub_binding_failures_total",
                "Chains the signer failed to bind"
            ),
            registry
        )
        .expect("failed to register binding_failures counter");

        let activity_ticks = register_int_counter_with_registry!(
            Opts::new("govhub_activity_ticks_total", "Activity count sweeps"),
            registry
        )
        .expect("failed to register activity_ticks counter");

        let stale_results_discarded = register_int_counter_with_registry!(
            Opts::new(
                "govhub_stale_results_discarded_total",
                "Fetch results dropped after the active chain changed"
            ),
            registry
        )
        .expect("failed to register stale_results_discarded counter");

        let submissions = register_int_counter_vec_with_registry!(
            Opts::new("govhub_vote_submissions_total", "Vote submissions by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register submissions counter");

        let active_proposals = register_int_gauge_with_registry!(
            Opts::new(
                "govhub_active_proposals",
                "Proposals in the active chain's current view"
            ),
            registry
        )
        .expect("failed to register active_proposals gauge");

        // 5 ms → ~80 s
        let fetch_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "govhub_fetch_duration_ms",
                "Proposal fetch time including tallies, in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(5.0, 2.0, 15).unwrap()),
            registry
        )
        .expect("failed to register fetch_duration_ms histogram");

        Self {
            registry,
            proposal_fetches,
            fetch_failures,
            tally_failures,
            vote_queries,
            vote_query_failures,
            binding_failures,
            activity_ticks,
            stale_results_discarded,
            submissions,
            active_proposals,
            fetch_duration_ms,
        }
    }

    pub fn record_submission(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn submissions_with(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for AggregatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_metrics() {
        let metrics = AggregatorMetrics::new();
        metrics.proposal_fetches.inc();
        metrics.record_submission(OUTCOME_REJECTED);
        let text = metrics.encode().unwrap();
        assert!(text.contains("govhub_proposal_fetches_total 1"));
        assert!(text.contains("govhub_vote_submissions_total{outcome=\"rejected\"} 1"));
        assert_eq!(metrics.submissions_with(OUTCOME_CONFIRMED), 0);
    }
}
