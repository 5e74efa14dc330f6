//! Aggregator configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use govhub_client::{http::DEFAULT_GOV_API_PREFIX, WatchOnlySigner};
use govhub_registry::ChainRegistry;
use govhub_types::{Address, ChainDescriptor, ChainId};

use crate::AggregatorError;

/// Configuration for the governance aggregator.
///
/// Can be loaded from a TOML file via [`AggregatorConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Table-valued fields come last so
/// the struct always serializes to valid TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Chain to select on startup. Defaults to the first registered chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chain: Option<String>,

    /// Path prefix of the governance REST API on every chain.
    #[serde(default = "default_gov_api_prefix")]
    pub gov_api_prefix: String,

    /// Seconds between activity-count sweeps.
    #[serde(default = "default_activity_interval_secs")]
    pub activity_interval_secs: u64,

    /// Whole-request timeout for REST queries.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout for REST queries.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum tally requests in flight during one proposal fetch.
    #[serde(default = "default_tally_concurrency")]
    pub tally_concurrency: usize,

    /// Whether to enable the HTTP server.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// HTTP port (if enabled).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Whether to expose Prometheus metrics on the HTTP server.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Addresses tracked read-only, keyed by chain id.
    #[serde(default)]
    pub watch_addresses: BTreeMap<String, String>,

    /// Chains to aggregate. Defaults to the built-in registry.
    #[serde(default = "default_chains")]
    pub chains: Vec<ChainDescriptor>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_gov_api_prefix() -> String {
    DEFAULT_GOV_API_PREFIX.to_string()
}

fn default_activity_interval_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_tally_concurrency() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    7088
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chains() -> Vec<ChainDescriptor> {
    ChainRegistry::builtin().list().to_vec()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AggregatorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, AggregatorError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AggregatorError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, AggregatorError> {
        toml::from_str(s).map_err(|e| AggregatorError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("AggregatorConfig is always serializable to TOML")
    }

    /// Build the chain registry, rejecting empty or duplicate chain lists.
    pub fn registry(&self) -> Result<ChainRegistry, AggregatorError> {
        Ok(ChainRegistry::new(self.chains.clone())?)
    }

    /// The chain to select first. An unknown `default_chain` is a config error.
    pub fn initial_chain(&self, registry: &ChainRegistry) -> Result<ChainId, AggregatorError> {
        match &self.default_chain {
            Some(id) => {
                let id = ChainId::new(id.as_str());
                registry
                    .by_id(&id)
                    .map(|chain| chain.chain_id.clone())
                    .map_err(|_| AggregatorError::Config(format!("unknown default_chain {id}")))
            }
            None => Ok(registry.default_chain().chain_id.clone()),
        }
    }

    /// A read-only signer over `watch_addresses`, or `None` if none are set.
    pub fn watch_signer(&self) -> Option<WatchOnlySigner> {
        if self.watch_addresses.is_empty() {
            return None;
        }
        let accounts: HashMap<ChainId, Address> = self
            .watch_addresses
            .iter()
            .map(|(chain, addr)| (ChainId::new(chain.as_str()), Address::new(addr.as_str())))
            .collect();
        Some(WatchOnlySigner::new(accounts))
    }

    pub fn activity_interval(&self) -> Duration {
        Duration::from_secs(self.activity_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            default_chain: None,
            gov_api_prefix: default_gov_api_prefix(),
            activity_interval_secs: default_activity_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            tally_concurrency: default_tally_concurrency(),
            enable_rpc: default_true(),
            rpc_port: default_rpc_port(),
            enable_metrics: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
            watch_addresses: BTreeMap::new(),
            chains: default_chains(),
        }
    }
}
