//! Per-chain wallet binding.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use govhub_client::{Signer, SignerError};
use govhub_types::{Address, ChainDescriptor, ChainId};

use crate::cache::AggregationCache;
use crate::metrics::AggregatorMetrics;
use crate::tracing_spans::bind_span;
use crate::AggregatorError;

/// Outcome of binding a signer to a set of chains.
#[derive(Clone, Debug, Default)]
pub struct BindReport {
    pub bound: HashMap<ChainId, Address>,
    /// One `ChainBindingFailed` per chain that could not be bound.
    pub failures: Vec<AggregatorError>,
}

pub struct WalletSession {
    cache: Arc<AggregationCache>,
    metrics: Arc<AggregatorMetrics>,
}

impl WalletSession {
    pub fn new(cache: Arc<AggregationCache>, metrics: Arc<AggregatorMetrics>) -> Self {
        Self { cache, metrics }
    }

    /// Authorize every chain with the signer and record its account address.
    ///
    /// Chains are bound independently: a failure on one chain is reported in
    /// the [`BindReport`] and does not affect the others. Successful chains
    /// overwrite their previous binding; chains not in `chains` keep theirs.
    pub async fn bind_all(
        &self,
        chains: &[ChainDescriptor],
        signer: Option<&Arc<dyn Signer>>,
    ) -> Result<BindReport, AggregatorError> {
        let signer = signer.ok_or(AggregatorError::SignerUnavailable)?;

        let results = join_all(chains.iter().map(|chain| {
            let chain_id = chain.chain_id.clone();
            async move {
                let result = bind_one(signer.as_ref(), &chain_id).await;
                (chain_id, result)
            }
            .instrument(bind_span(chain.chain_id.as_str()))
        }))
        .await;

        let mut report = BindReport::default();
        for (chain_id, result) in results {
            match result {
                Ok(address) => {
                    debug!(chain = %chain_id, address = %address, "chain bound");
                    self.cache.bind_address(chain_id.clone(), address.clone()).await;
                    report.bound.insert(chain_id, address);
                }
                Err(e) => {
                    self.metrics.binding_failures.inc();
                    warn!(chain = %chain_id, error = %e, "chain binding failed");
                    report.failures.push(AggregatorError::ChainBindingFailed {
                        chain_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            signer = signer.name(),
            bound = report.bound.len(),
            failed = report.failures.len(),
            "wallet binding complete"
        );
        Ok(report)
    }
}

async fn bind_one(signer: &dyn Signer, chain_id: &ChainId) -> Result<Address, SignerError> {
    signer.enable(chain_id).await?;
    signer.get_account(chain_id).await
}
