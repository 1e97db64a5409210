//! dappshell broker
//!
//! Reads frame messages and approval decisions as NDJSON on stdin and writes
//! replies and queue notifications as NDJSON on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use dappshell_broker::Broker;
use dappshell_broker::host;
use dappshell_broker::provider::{HttpProvider, HttpProviderConfig};
use dappshell_broker::store::JsonFileStore;

#[derive(Parser, Debug)]
#[command(name = "dappshell-broker")]
#[command(version, about = "dappshell broker - dapp frame request broker")]
struct Args {
    /// Project directory to read `.dappshell/settings.json` from
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Identifier frames address messages to
    #[arg(long, env = "DAPPSHELL_BROKER_ID")]
    broker_id: Option<String>,

    /// JSON-RPC endpoint of the node
    #[arg(long, env = "DAPPSHELL_PROVIDER_URL")]
    provider_url: Option<String>,

    /// File holding persisted permissions and dapp visibility
    #[arg(long, env = "DAPPSHELL_STORE_PATH")]
    store_path: Option<PathBuf>,

    /// Log level filter for the broker (e.g. "info", "debug", "warn").
    #[arg(long, env = "DAPPSHELL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "DAPPSHELL_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = dappshell_core::config::load_config(args.project_dir.as_deref())?;
    if let Some(broker_id) = args.broker_id {
        config.broker.broker_id = broker_id;
    }
    if let Some(url) = args.provider_url {
        config.provider.url = url;
    }
    if let Some(path) = args.store_path {
        config.broker.store_path = Some(path);
    }
    if let Some(level) = args.log_level {
        config.broker.log_level = level;
    }

    dappshell_core::tracing_init::init_tracing(&config.broker.log_level, args.log_json);

    let store_path = match config.broker.store_path.clone() {
        Some(path) => path,
        None => dappshell_core::config::default_store_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine store location"))?,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        broker_id = %config.broker.broker_id,
        provider = %config.provider.url,
        store = %store_path.display(),
        dapps = config.dapps.len(),
        "Starting dappshell-broker"
    );

    let store = Arc::new(JsonFileStore::open(&store_path)?);
    let provider = Arc::new(HttpProvider::new(&HttpProviderConfig {
        url: config.provider.url.clone(),
    })?);
    let broker = Broker::new(&config.broker.broker_id, provider, store, &config.dapps);

    let input = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = host::run(broker, input, tokio::io::stdout()) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C shutdown signal");
        }
    }

    info!("Broker stopped");
    Ok(())
}
