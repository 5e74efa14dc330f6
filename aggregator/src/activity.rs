//! Active-proposal counts across every registered chain.
//!
//! [`ActivityCounter`] performs one sweep; [`ActivityTicker`] repeats it on a
//! fixed timer and writes each sweep's result into the cache, replacing the
//! previous one.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Instrument};

use govhub_client::GovQuery;
use govhub_types::{ChainDescriptor, ChainId};

use crate::cache::AggregationCache;
use crate::metrics::AggregatorMetrics;
use crate::tracing_spans::activity_tick_span;
use crate::AggregatorError;

/// Outcome of one activity sweep.
///
/// Chains with zero active proposals appear in neither map.
#[derive(Clone, Debug, Default)]
pub struct ActivityReport {
    pub counts: HashMap<ChainId, usize>,
    pub failures: Vec<AggregatorError>,
}

impl ActivityReport {
    /// Failure reasons keyed by chain, as stored in the cache.
    pub fn failure_reasons(&self) -> HashMap<ChainId, String> {
        self.failures
            .iter()
            .filter_map(|failure| match failure {
                AggregatorError::CountFailed { chain_id, reason } => {
                    Some((chain_id.clone(), reason.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

pub struct ActivityCounter {
    query: Arc<dyn GovQuery>,
    metrics: Arc<AggregatorMetrics>,
}

impl ActivityCounter {
    pub fn new(query: Arc<dyn GovQuery>, metrics: Arc<AggregatorMetrics>) -> Self {
        Self { query, metrics }
    }

    /// Count voting-period proposals on every chain concurrently.
    pub async fn count_active(&self, chains: &[ChainDescriptor]) -> ActivityReport {
        self.metrics.activity_ticks.inc();
        let results = join_all(chains.iter().map(|chain| async move {
            (
                chain.chain_id.clone(),
                self.query.voting_proposal_count(chain).await,
            )
        }))
        .instrument(activity_tick_span(chains.len()))
        .await;

        let mut report = ActivityReport::default();
        for (chain_id, result) in results {
            match result {
                Ok(0) => {}
                Ok(count) => {
                    report.counts.insert(chain_id, count);
                }
                Err(e) => {
                    warn!(chain = %chain_id, error = %e, "activity count failed");
                    report.failures.push(AggregatorError::CountFailed {
                        chain_id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        debug!(
            active_chains = report.counts.len(),
            failures = report.failures.len(),
            "activity sweep complete"
        );
        report
    }

    /// Run one sweep and replace the cache's activity view with it.
    pub async fn refresh(&self, cache: &AggregationCache, chains: &[ChainDescriptor]) {
        let report = self.count_active(chains).await;
        let failures = report.failure_reasons();
        cache.replace_activity(report.counts, failures).await;
    }
}

/// Handle to the recurring activity sweep.
///
/// The first sweep runs immediately. Dropping the handle stops the task.
pub struct ActivityTicker {
    handle: JoinHandle<()>,
}

impl ActivityTicker {
    pub fn spawn(
        counter: Arc<ActivityCounter>,
        cache: Arc<AggregationCache>,
        chains: Vec<ChainDescriptor>,
        period: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(chains = chains.len(), period_secs = period.as_secs(), "activity ticker started");
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!("activity ticker shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        counter.refresh(&cache, &chains).await;
                    }
                }
            }
        });
        Self { handle }
    }

    /// Stop the ticker. A sweep in progress is abandoned.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ActivityTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
