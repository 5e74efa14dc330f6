//! The aggregator facade: owns every component plus the cache and applies
//! the refresh rules between them.
//!
//! - Selecting a chain fetches its proposals, then refreshes votes.
//! - Binding a wallet refreshes votes for the active chain.
//! - The activity ticker runs independently of both.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use govhub_client::{GovQuery, Signer};
use govhub_registry::ChainRegistry;
use govhub_types::{ChainDescriptor, ChainId, ProposalId, VoteOption};

use crate::activity::{ActivityCounter, ActivityReport, ActivityTicker};
use crate::background::BackgroundTasks;
use crate::cache::{AggregationCache, CacheSnapshot, ChainTicket};
use crate::config::AggregatorConfig;
use crate::fetcher::ProposalFetcher;
use crate::metrics::AggregatorMetrics;
use crate::session::{BindReport, WalletSession};
use crate::submission::{SubmissionEvent, SubmissionReceipt, VoteRequest, VoteSubmitter};
use crate::vote_status::VoteStatusTracker;
use crate::AggregatorError;

/// Tuning knobs that do not come from the chain list.
#[derive(Clone, Debug)]
pub struct AggregatorOptions {
    pub tally_concurrency: usize,
    pub activity_interval: Duration,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            tally_concurrency: 16,
            activity_interval: Duration::from_secs(300),
        }
    }
}

impl From<&AggregatorConfig> for AggregatorOptions {
    fn from(config: &AggregatorConfig) -> Self {
        Self {
            tally_concurrency: config.tally_concurrency,
            activity_interval: config.activity_interval(),
        }
    }
}

/// Outcome of a proposal refresh that did not fail outright.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// The result was stored as the active chain's view.
    Applied {
        chain_id: ChainId,
        proposals: usize,
        tally_failures: Vec<AggregatorError>,
        /// Vote slots written by the follow-up vote refresh.
        votes: usize,
    },
    /// The active chain changed while the fetch was in flight; nothing was stored.
    Stale { chain_id: ChainId },
}

pub struct Aggregator {
    registry: ChainRegistry,
    options: AggregatorOptions,
    cache: Arc<AggregationCache>,
    metrics: Arc<AggregatorMetrics>,
    fetcher: ProposalFetcher,
    activity: Arc<ActivityCounter>,
    session: WalletSession,
    votes: VoteStatusTracker,
    submitter: VoteSubmitter,
    signer: RwLock<Option<Arc<dyn Signer>>>,
    background: BackgroundTasks,
}

impl Aggregator {
    pub fn new(
        registry: ChainRegistry,
        query: Arc<dyn GovQuery>,
        options: AggregatorOptions,
    ) -> Self {
        let cache = Arc::new(AggregationCache::new());
        let metrics = Arc::new(AggregatorMetrics::new());
        Self {
            fetcher: ProposalFetcher::new(
                query.clone(),
                metrics.clone(),
                options.tally_concurrency,
            ),
            activity: Arc::new(ActivityCounter::new(query.clone(), metrics.clone())),
            session: WalletSession::new(cache.clone(), metrics.clone()),
            votes: VoteStatusTracker::new(query, metrics.clone()),
            submitter: VoteSubmitter::new(cache.clone(), metrics.clone()),
            signer: RwLock::new(None),
            background: BackgroundTasks::new(),
            registry,
            options,
            cache,
            metrics,
        }
    }

    pub fn from_config(
        config: &AggregatorConfig,
        query: Arc<dyn GovQuery>,
    ) -> Result<Self, AggregatorError> {
        Ok(Self::new(config.registry()?, query, config.into()))
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<AggregationCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<AggregatorMetrics> {
        &self.metrics
    }

    /// A receiver notified when [`shutdown`](Self::shutdown) runs.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.background.subscribe()
    }

    pub fn subscribe_submissions(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.submitter.subscribe()
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot().await
    }

    // ── Signer ──────────────────────────────────────────────────────────

    pub async fn attach_signer(&self, signer: Arc<dyn Signer>) {
        info!(signer = signer.name(), "signer attached");
        *self.signer.write().await = Some(signer);
    }

    /// Drop the signer. Existing address bindings are kept.
    pub async fn detach_signer(&self) {
        *self.signer.write().await = None;
    }

    pub async fn has_signer(&self) -> bool {
        self.signer.read().await.is_some()
    }

    /// Bind the attached signer to every registered chain, then refresh
    /// votes if the active chain is among the newly bound.
    pub async fn connect_wallet(&self) -> Result<BindReport, AggregatorError> {
        let signer = self.signer.read().await.clone();
        let report = self
            .session
            .bind_all(self.registry.list(), signer.as_ref())
            .await?;

        if let Some(active) = self.cache.active_chain().await {
            if report.bound.contains_key(&active) {
                self.refresh_votes().await;
            }
        }
        Ok(report)
    }

    // ── Proposals and votes ─────────────────────────────────────────────

    /// Make `chain_id` the active chain and fetch its proposals.
    pub async fn select_chain(&self, chain_id: &ChainId) -> Result<Refresh, AggregatorError> {
        let chain = self.registry.by_id(chain_id)?.clone();
        let ticket = self.cache.set_active_chain(chain.chain_id.clone()).await;
        info!(chain = %chain.chain_id, "active chain selected");
        self.fetch_into(&chain, ticket).await
    }

    /// Re-fetch the active chain's proposals, selecting the first registered
    /// chain if none is active yet.
    pub async fn refresh_proposals(&self) -> Result<Refresh, AggregatorError> {
        match self.cache.begin_fetch().await {
            Some(ticket) => {
                let chain = self.registry.by_id(&ticket.chain_id)?.clone();
                self.fetch_into(&chain, ticket).await
            }
            None => {
                let default = self.registry.default_chain().chain_id.clone();
                self.select_chain(&default).await
            }
        }
    }

    async fn fetch_into(
        &self,
        chain: &ChainDescriptor,
        ticket: ChainTicket,
    ) -> Result<Refresh, AggregatorError> {
        match self.fetcher.fetch_active(chain).await {
            Ok(fetched) => {
                let count = fetched.proposals.len();
                if !self.cache.store_proposals(&ticket, Ok(fetched.proposals)).await {
                    return Ok(self.discard_stale(ticket));
                }
                self.metrics.active_proposals.set(count as i64);
                let votes = self.refresh_votes().await;
                Ok(Refresh::Applied {
                    chain_id: ticket.chain_id,
                    proposals: count,
                    tally_failures: fetched.tally_failures,
                    votes,
                })
            }
            Err(e) => {
                if !self.cache.store_proposals(&ticket, Err(e.to_string())).await {
                    return Ok(self.discard_stale(ticket));
                }
                self.metrics.active_proposals.set(0);
                Err(e)
            }
        }
    }

    fn discard_stale(&self, ticket: ChainTicket) -> Refresh {
        self.metrics.stale_results_discarded.inc();
        info!(chain = %ticket.chain_id, "discarding proposals for a chain no longer active");
        Refresh::Stale {
            chain_id: ticket.chain_id,
        }
    }

    /// Query the bound account's vote on every proposal of the active chain.
    ///
    /// Does nothing unless the active chain has both a bound address and a
    /// non-empty proposal list. Returns the number of vote slots written.
    pub async fn refresh_votes(&self) -> usize {
        let Some(chain_id) = self.cache.active_chain().await else {
            return 0;
        };
        let Some(address) = self.cache.address(&chain_id).await else {
            return 0;
        };
        let proposals = self.cache.current_proposals().await;
        if proposals.is_empty() {
            return 0;
        }
        let chain = match self.registry.by_id(&chain_id) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(error = %e, "active chain missing from registry");
                return 0;
            }
        };

        let mut written = 0;
        for (proposal_id, status) in self.votes.refresh_all(chain, &address, &proposals).await {
            if self
                .cache
                .store_vote_if_bound(chain_id.clone(), proposal_id, &address, status)
                .await
            {
                written += 1;
            }
        }
        written
    }

    /// Vote on a proposal of `chain_id` with the address bound for that chain.
    pub async fn submit_vote(
        &self,
        chain_id: &ChainId,
        proposal_id: ProposalId,
        option: VoteOption,
    ) -> Result<SubmissionReceipt, AggregatorError> {
        let chain = self.registry.by_id(chain_id)?.clone();
        let address =
            self.cache
                .address(chain_id)
                .await
                .ok_or_else(|| AggregatorError::NotReady {
                    chain_id: chain_id.clone(),
                    reason: "no address bound".into(),
                })?;
        let signer = self.signer.read().await.clone();
        let request = VoteRequest {
            chain,
            proposal_id,
            address,
            option,
        };
        self.submitter.submit_vote(signer.as_ref(), &request).await
    }

    // ── Activity ────────────────────────────────────────────────────────

    /// Run one activity sweep over every registered chain now.
    pub async fn refresh_activity(&self) -> ActivityReport {
        let report = self.activity.count_active(self.registry.list()).await;
        self.cache
            .replace_activity(report.counts.clone(), report.failure_reasons())
            .await;
        report
    }

    /// Start (or restart) the activity ticker over `chains`.
    pub async fn watch_activity(&self, chains: Vec<ChainDescriptor>) {
        let ticker = ActivityTicker::spawn(
            self.activity.clone(),
            self.cache.clone(),
            chains,
            self.options.activity_interval,
            self.background.subscribe(),
        );
        self.background.replace_ticker(ticker).await;
    }

    /// Start the activity ticker over every registered chain.
    pub async fn start_activity_ticker(&self) {
        self.watch_activity(self.registry.list().to_vec()).await;
    }

    pub async fn stop_activity(&self) {
        self.background.stop_ticker().await;
    }

    /// Signal every background task to stop. The ticker cannot be restarted.
    pub async fn shutdown(&self) {
        self.background.stop_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govhub_client::ClientError;
    use govhub_nullables::{fixtures, NullGovQuery, NullSigner};
    use govhub_types::{Address, VoteStatus};

    fn aggregator(query: Arc<NullGovQuery>, chains: &[&str]) -> Aggregator {
        let registry =
            ChainRegistry::new(chains.iter().map(|id| fixtures::chain(id)).collect()).unwrap();
        Aggregator::new(registry, query, AggregatorOptions::default())
    }

    #[tokio::test]
    async fn refresh_without_selection_uses_first_chain() {
        let query = Arc::new(NullGovQuery::new());
        query.set_proposals("a", vec![fixtures::proposal("1")]);
        let agg = aggregator(query, &["a", "b"]);

        let refresh = agg.refresh_proposals().await.unwrap();
        assert!(matches!(refresh, Refresh::Applied { proposals: 1, .. }));
        assert_eq!(agg.cache().active_chain().await, Some(ChainId::new("a")));
    }

    #[tokio::test]
    async fn unknown_chain_is_registry_error() {
        let agg = aggregator(Arc::new(NullGovQuery::new()), &["a"]);
        let err = agg.select_chain(&ChainId::new("zzz")).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Registry(_)));
    }

    #[tokio::test]
    async fn fetch_failure_clears_view_and_records_reason() {
        let query = Arc::new(NullGovQuery::new());
        query.fail_proposals("a", ClientError::Transport("refused".into()));
        let agg = aggregator(query, &["a"]);

        let err = agg.select_chain(&ChainId::new("a")).await.unwrap_err();
        assert!(matches!(err, AggregatorError::FetchFailed { .. }));

        let snapshot = agg.snapshot().await;
        assert!(snapshot.proposals.is_empty());
        assert!(snapshot.fetch_error.is_some());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn binding_active_chain_triggers_vote_refresh() {
        let query = Arc::new(NullGovQuery::new());
        query.set_proposals("a", vec![fixtures::proposal("1")]);
        let agg = aggregator(query.clone(), &["a", "b"]);
        agg.select_chain(&ChainId::new("a")).await.unwrap();
        assert_eq!(query.vote_calls(), 0);

        agg.attach_signer(Arc::new(NullSigner::new().with_account("a", "addr-a")))
            .await;
        let report = agg.connect_wallet().await.unwrap();
        assert_eq!(report.bound.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(query.vote_calls(), 1);
        assert_eq!(
            agg.cache()
                .vote(&ChainId::new("a"), &ProposalId::new("1"))
                .await,
            Some(VoteStatus::Absent)
        );
    }

    #[tokio::test]
    async fn connect_without_signer_is_signer_unavailable() {
        let agg = aggregator(Arc::new(NullGovQuery::new()), &["a"]);
        assert_eq!(
            agg.connect_wallet().await.unwrap_err(),
            AggregatorError::SignerUnavailable
        );
    }

    #[tokio::test]
    async fn submit_requires_binding() {
        let agg = aggregator(Arc::new(NullGovQuery::new()), &["a"]);
        agg.attach_signer(Arc::new(NullSigner::new())).await;
        let err = agg
            .submit_vote(&ChainId::new("a"), ProposalId::new("1"), VoteOption::Yes)
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::NotReady { .. }));
    }

    #[tokio::test]
    async fn detached_signer_keeps_bindings() {
        let agg = aggregator(Arc::new(NullGovQuery::new()), &["a"]);
        agg.attach_signer(Arc::new(NullSigner::new().with_account("a", "addr-a")))
            .await;
        agg.connect_wallet().await.unwrap();
        agg.detach_signer().await;

        assert!(!agg.has_signer().await);
        assert_eq!(
            agg.cache().address(&ChainId::new("a")).await,
            Some(Address::new("addr-a"))
        );
        let err = agg
            .submit_vote(&ChainId::new("a"), ProposalId::new("1"), VoteOption::Yes)
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::NotReady { .. }));
    }

    #[tokio::test]
    async fn manual_activity_refresh_fills_cache() {
        let query = Arc::new(NullGovQuery::new());
        query.set_count("b", 4);
        let agg = aggregator(query, &["a", "b"]);

        let report = agg.refresh_activity().await;
        assert_eq!(report.counts.len(), 1);
        assert_eq!(agg.cache().activity().await[&ChainId::new("b")], 4);
    }
}
