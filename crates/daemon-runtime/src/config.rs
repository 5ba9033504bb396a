//! Daemon configuration loaded from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tdex_reconciler::ReconcilerConfig;

/// Default Esplora endpoint (Liquid mainnet).
pub const DEFAULT_EXPLORER_URL: &str = "https://blockstream.info/liquid/api";

/// Explorer settings for the confirmation oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Esplora REST base URL.
    pub url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EXPLORER_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl ExplorerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Full daemon configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Listener settings.
    pub reconciler: ReconcilerConfig,
    /// Confirmation oracle settings.
    pub explorer: ExplorerConfig,
    /// Fee account addresses already derived by the wallet.
    pub fee_addresses: Vec<String>,
}

/// Load configuration from the environment.
///
/// - `TDEX_BASE_ASSET`, `TDEX_FEE_ACCOUNT_BALANCE_THRESHOLD`: listener
/// - `TDEX_EXPLORER_URL`: Esplora endpoint
/// - `TDEX_EXPLORER_TIMEOUT_SECS`: explorer request timeout
/// - `TDEX_FEE_ADDRESSES`: comma separated fee account addresses
pub fn load_config() -> Result<DaemonConfig> {
    let mut config = DaemonConfig {
        reconciler: ReconcilerConfig::from_env().context("invalid listener configuration")?,
        ..DaemonConfig::default()
    };

    if let Ok(url) = env::var("TDEX_EXPLORER_URL") {
        config.explorer.url = url;
    }
    if let Ok(raw) = env::var("TDEX_EXPLORER_TIMEOUT_SECS") {
        config.explorer.timeout_secs = raw
            .parse()
            .with_context(|| format!("TDEX_EXPLORER_TIMEOUT_SECS must be an integer, got '{}'", raw))?;
    }
    if let Ok(raw) = env::var("TDEX_FEE_ADDRESSES") {
        config.fee_addresses = parse_address_list(&raw);
    }

    Ok(config)
}

fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
