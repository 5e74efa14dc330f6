//! Log output for the daemon.
//!
//! `log_format = "json"` writes one JSON object per line with the current
//! span attached (chain fetch, tally and vote-query spans carry the chain id);
//! anything else writes human-readable lines.
//!
//! A bare level from config also caps the HTTP transport crates at `warn`, so
//! `debug` shows the aggregator's own spans without connection chatter.
//! `RUST_LOG`, or a level string that is already a directive list, is used
//! verbatim.

use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const TRANSPORT_CRATES: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    /// Parse the config value; anything but `"json"` means human output.
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Human
        }
    }
}

/// Filter directives for a configured `level`.
///
/// An unrecognised bare level falls back to `info`.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains(['=', ',']) {
        return level.to_string();
    }
    let base = match level.parse::<LevelFilter>() {
        Ok(filter) => filter.to_string().to_lowercase(),
        Err(_) => "info".to_string(),
    };
    let mut directives = base;
    for krate in TRANSPORT_CRATES {
        directives.push_str(&format!(",{krate}=warn"));
    }
    directives
}

/// Initialise the global tracing subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging(format: LogFormat, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    match format {
        LogFormat::Human => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true).with_current_span(true))
                .init();
        }
    }
}
