//! # TDEX Daemon Listener
//!
//! Runs the blockchain listener until Ctrl+C.

use anyhow::Result;
use tdex_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};
use tracing::{debug, info, warn};

use daemon_runtime::{load_config, DaemonRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config = load_config()?;
    if config.fee_addresses.is_empty() {
        warn!("No fee account addresses configured, markets will stay closed");
    }
    info!(
        base_asset = %config.reconciler.base_asset,
        threshold = config.reconciler.fee_balance_threshold,
        explorer = %config.explorer.url,
        "Configuration loaded"
    );

    let mut runtime = DaemonRuntime::new(config)?;
    runtime.start()?;

    info!("Listener is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    if let Some(stats) = runtime.shutdown().await? {
        info!(
            skipped_utxos = stats.skipped_utxos,
            commit_failed = stats.commit_failed,
            "Listener statistics"
        );
    }

    match gather_metrics() {
        Ok(text) if !text.is_empty() => debug!(metrics = %text, "Final metrics"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Unable to export metrics"),
    }

    Ok(())
}
