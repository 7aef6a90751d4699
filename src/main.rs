//! # secwd
//!
//! Entry point for the security-wallet and credential-asset-mapping
//! daemon. Parses `--verbose`/`--config`, wires the real collaborators,
//! and starts serving. The wire transports themselves are a
//! collaborator seam — this binary stops short of binding one.

use anyhow::Result;
use clap::Parser;

use secwd::config::DaemonConfig;
use secwd::observability;
use secwd::runtime;

#[derive(Debug, Parser)]
#[command(name = "secwd", about = "Security wallet and credential-asset-mapping daemon")]
struct Args {
    /// Enable verbose (debug-level) logging.
    #[arg(long)]
    verbose: bool,

    /// Path to the portfolio configuration file.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    observability::init_tracing(args.verbose);

    let mut config = DaemonConfig::from_env();
    config.verbose = config.verbose || args.verbose;
    if let Some(path) = args.config {
        config.config_path = path;
    }

    let daemon = runtime::initialize(&config)?;
    tracing::info!(
        portfolios = daemon.sws.handle("", "GET_PORTFOLIO_LIST", &[]).map(|v| v.to_string()).unwrap_or_default(),
        "secwd ready"
    );

    // A real deployment binds RequestTransport/NotificationPublisher
    // implementations here and loops on `daemon.sws`/`daemon.cams`.
    Ok(())
}
