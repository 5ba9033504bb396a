//! # Listener Configuration
//!
//! Base asset and fee-account liquidity threshold.

use crate::domain::{ReconcilerError, DEFAULT_FEE_BALANCE_THRESHOLD, LBTC_ASSET};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable overriding the base asset.
pub const BASE_ASSET_ENV: &str = "TDEX_BASE_ASSET";

/// Environment variable overriding the fee balance threshold.
pub const FEE_THRESHOLD_ENV: &str = "TDEX_FEE_ACCOUNT_BALANCE_THRESHOLD";

/// Blockchain listener configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Asset in which fee-account liquidity is measured.
    pub base_asset: String,

    /// Minimum fee-account balance (base asset smallest unit) for markets
    /// to stay open.
    pub fee_balance_threshold: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            base_asset: LBTC_ASSET.to_string(),
            fee_balance_threshold: DEFAULT_FEE_BALANCE_THRESHOLD,
        }
    }
}

impl ReconcilerConfig {
    /// Create a config for testing (short base asset, round threshold).
    pub fn for_testing() -> Self {
        Self {
            base_asset: "lbtc".to_string(),
            fee_balance_threshold: 100_000,
        }
    }

    /// Load from environment, falling back to defaults.
    ///
    /// - `TDEX_BASE_ASSET`: base asset hash (default: L-BTC)
    /// - `TDEX_FEE_ACCOUNT_BALANCE_THRESHOLD`: threshold (default: 5000)
    pub fn from_env() -> Result<Self, ReconcilerError> {
        let mut config = Self::default();

        if let Ok(asset) = env::var(BASE_ASSET_ENV) {
            config.base_asset = asset;
        }

        if let Ok(raw) = env::var(FEE_THRESHOLD_ENV) {
            config.fee_balance_threshold = raw.parse().map_err(|_| {
                ReconcilerError::InvalidConfig(format!(
                    "{} must be a non-negative integer, got '{}'",
                    FEE_THRESHOLD_ENV, raw
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<(), ReconcilerError> {
        if self.base_asset.is_empty() {
            return Err(ReconcilerError::InvalidConfig(
                "base asset must not be empty".to_string(),
            ));
        }
        if !self.base_asset.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ReconcilerError::InvalidConfig(format!(
                "base asset '{}' is not an asset hash",
                self.base_asset
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.base_asset, LBTC_ASSET);
        assert_eq!(config.fee_balance_threshold, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = ReconcilerConfig::for_testing();
        assert_eq!(config.fee_balance_threshold, 100_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_base_asset_rejected() {
        let config = ReconcilerConfig {
            base_asset: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReconcilerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = ReconcilerConfig::for_testing();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ReconcilerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
