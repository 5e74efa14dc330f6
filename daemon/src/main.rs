//! govhub daemon: aggregates governance proposals across chains and serves
//! them over HTTP.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use govhub_aggregator::{init_logging, Aggregator, AggregatorConfig, LogFormat};
use govhub_client::{HttpGovClient, Signer};
use govhub_rpc::RpcServer;

#[derive(Parser)]
#[command(name = "govhub-daemon", about = "Multi-chain governance aggregator")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GOVHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Chain to select on startup (defaults to the first configured chain).
    #[arg(long, env = "GOVHUB_DEFAULT_CHAIN")]
    default_chain: Option<String>,

    /// Governance REST path prefix.
    #[arg(long, env = "GOVHUB_GOV_API_PREFIX")]
    gov_api_prefix: Option<String>,

    /// Seconds between activity-count sweeps.
    #[arg(long, env = "GOVHUB_ACTIVITY_INTERVAL_SECS")]
    activity_interval_secs: Option<u64>,

    /// Addresses to track read-only ("chain-id=address", comma-separated).
    #[arg(long, env = "GOVHUB_WATCH", value_delimiter = ',')]
    watch: Vec<String>,

    /// Disable the HTTP server.
    #[arg(long, env = "GOVHUB_DISABLE_RPC")]
    no_rpc: bool,

    /// HTTP server port.
    #[arg(long, env = "GOVHUB_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "GOVHUB_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "GOVHUB_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GOVHUB_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the aggregator and HTTP server until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration as TOML and exit.
    PrintConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<AggregatorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            AggregatorConfig::from_toml_file(&path)
                .with_context(|| format!("failed to load config file {path}"))?
        }
        None => AggregatorConfig::default(),
    };

    if let Some(chain) = &cli.default_chain {
        config.default_chain = Some(chain.clone());
    }
    if let Some(prefix) = &cli.gov_api_prefix {
        config.gov_api_prefix = prefix.clone();
    }
    if let Some(secs) = cli.activity_interval_secs {
        config.activity_interval_secs = secs;
    }
    for entry in &cli.watch {
        let (chain, address) = entry
            .split_once('=')
            .with_context(|| format!("--watch entry {entry:?} is not chain-id=address"))?;
        config
            .watch_addresses
            .insert(chain.trim().to_string(), address.trim().to_string());
    }
    config.enable_rpc = config.enable_rpc && !cli.no_rpc;
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    config.enable_metrics = config.enable_metrics || cli.metrics;
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

/// Resolve on SIGINT, or SIGTERM where the platform has it.
async fn wait_for_signal() {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT, stopping aggregator"),
        _ = terminate => tracing::info!("received SIGTERM, stopping aggregator"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Command::PrintConfig = cli.command {
        print!("{}", config.to_toml_string());
        return Ok(());
    }

    init_logging(LogFormat::from_config(&config.log_format), &config.log_level);

    let query = HttpGovClient::new(config.request_timeout(), config.connect_timeout())?
        .with_api_prefix(config.gov_api_prefix.as_str());
    let aggregator = Arc::new(Aggregator::from_config(&config, Arc::new(query))?);
    let initial_chain = config.initial_chain(aggregator.registry())?;

    let rpc = if config.enable_rpc {
        config.rpc_port.to_string()
    } else {
        "off".into()
    };
    tracing::info!(
        chains = aggregator.registry().len(),
        initial_chain = %initial_chain,
        rpc = %rpc,
        "starting govhub daemon"
    );

    if let Some(watch) = config.watch_signer() {
        let signer: Arc<dyn Signer> = Arc::new(watch);
        aggregator.attach_signer(signer).await;
        let report = aggregator.connect_wallet().await?;
        for failure in &report.failures {
            tracing::warn!(error = %failure, "watch address not bound");
        }
    }

    if let Err(e) = aggregator.select_chain(&initial_chain).await {
        tracing::warn!(error = %e, "initial proposal fetch failed");
    }
    aggregator.start_activity_ticker().await;

    let rpc_handle = if config.enable_rpc {
        let server = RpcServer::new(config.rpc_port, aggregator.clone(), config.enable_metrics);
        let shutdown_rx = aggregator.subscribe_shutdown();
        Some(tokio::spawn(async move {
            if let Err(e) = server.start(shutdown_rx).await {
                tracing::error!(error = %e, "RPC server stopped");
            }
        }))
    } else {
        None
    };

    wait_for_signal().await;
    aggregator.shutdown().await;

    if let Some(handle) = rpc_handle {
        let _ = handle.await;
    }
    tracing::info!("govhub daemon exited cleanly");
    Ok(())
}
