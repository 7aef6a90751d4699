//! Daemon wiring: loads configuration and the on-disk stores, and
//! assembles the two servers plus their collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::DaemonConfig;
use crate::document::{CertificateValidator, NullCertificateValidator};
use crate::mapping::{CredentialAssetMappingServer, MappingStore};
use crate::srr::{HostIdentity, StaticHostIdentity};
use crate::wallet::config::PortfolioConfigData;
use crate::wallet::notify::{NotificationPublisher, NullPublisher};
use crate::wallet::{PortfolioConfig, SecurityWalletServer, WalletDatabase};

/// Everything a transport needs to start serving requests.
pub struct Daemon {
    pub sws: Arc<SecurityWalletServer>,
    pub cams: Arc<CredentialAssetMappingServer>,
    pub host_identity: Arc<dyn HostIdentity>,
}

/// Loads configuration and on-disk state and assembles both servers.
///
/// Failure to load the portfolio configuration is fatal — the wallet
/// cannot run without a schema of usages and rules — and propagates up
/// for the caller to exit the process on.
pub fn initialize(config: &DaemonConfig) -> Result<Daemon> {
    info!(config_path = %config.config_path, "loading portfolio configuration");
    let raw_config = std::fs::read_to_string(&config.config_path)
        .with_context(|| format!("reading portfolio configuration at {}", config.config_path))?;
    let entries: Vec<PortfolioConfigData> =
        serde_json::from_str(&raw_config).context("parsing portfolio configuration")?;

    let mut configs = HashMap::new();
    for entry in entries {
        let name = entry.portfolio_name.clone();
        let compiled = PortfolioConfig::compile(&entry)
            .with_context(|| format!("compiling client-rule regexes for portfolio '{name}'"))?;
        configs.insert(name, compiled);
    }

    let db_path = std::path::PathBuf::from(&config.database_path);
    let mut db = if db_path.exists() {
        WalletDatabase::load(&db_path).context("loading wallet database")?
    } else {
        WalletDatabase { portfolios: Vec::new() }
    };
    for name in configs.keys() {
        if !db.portfolios.iter().any(|p| &p.name == name) {
            db.portfolios.push(crate::wallet::Portfolio::new(name.clone()));
        }
    }

    let mapping_path = std::path::PathBuf::from(&config.mapping_path);
    let mapping_store = MappingStore::load(&mapping_path).context("loading mapping database")?;

    let certs: Arc<dyn CertificateValidator> = Arc::new(NullCertificateValidator);
    let publisher: Arc<dyn NotificationPublisher> = Arc::new(NullPublisher);
    let host_identity: Arc<dyn HostIdentity> = Arc::new(StaticHostIdentity(host_uuid()));

    let sws = Arc::new(SecurityWalletServer::new(db, configs, certs, publisher, db_path));
    let cams = Arc::new(CredentialAssetMappingServer::new(mapping_store, mapping_path));

    Ok(Daemon {
        sws,
        cams,
        host_identity,
    })
}

/// Reads a stable host identifier for SRR's `check_platform`
/// (`/etc/machine-id` on Linux, a fixed fallback otherwise — the real
/// platform-identity source is a collaborator).
fn host_uuid() -> String {
    std::fs::read_to_string("/etc/machine-id")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string())
}
