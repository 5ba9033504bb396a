//! # TDEX Telemetry
//!
//! Logging and metrics export for the TDEX daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tdex_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // tracing macros now reach the configured output
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `tdexd` | Service name in logs |
//! | `TDEX_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `TDEX_CONSOLE_OUTPUT` | `true` | Console output |
//! | `TDEX_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `TDEX_NETWORK` | `liquid` | Network name |

mod config;
mod logging;

pub use config::TelemetryConfig;

use prometheus::{Encoder, TextEncoder};
use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to export metrics: {0}")]
    MetricsExport(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install the global log subscriber.
///
/// Returns a guard to hold for the lifetime of the application. Fails if a
/// global subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Render every metric of the default Prometheus registry in text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsExport(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsExport(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics_renders_text() {
        let counter = prometheus::register_int_counter!(
            "tdex_telemetry_test_total",
            "Counter registered by the telemetry tests"
        )
        .unwrap();
        counter.inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("tdex_telemetry_test_total 1"));
    }
}
