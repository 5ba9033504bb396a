//! tdex-unlockerd: unlock the daemon wallet as soon as it is initialized.

use anyhow::{Context, Result};
use clap::Parser;
use tdex_telemetry::{init_telemetry, TelemetryConfig};
use tdex_unlocker::{
    new_provider, unlock_when_ready, Args, HttpWalletUnlocker, UnlockOutcome, UnlockerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_telemetry(TelemetryConfig::for_component("unlocker"))?;

    let config = UnlockerConfig::from_args(&args)?;
    let provider = new_provider(config.provider)?;

    let password = provider
        .password()
        .context("error while sourcing password")?;
    let tls_certificate = provider
        .tls_certificate()
        .context("error while sourcing TLS certificate")?;

    let client = HttpWalletUnlocker::new(&config.rpc_address(), &tls_certificate)
        .context("error while setting up RPC client")?;

    tdex_telemetry::log_event!(
        info,
        "unlocker",
        "connecting to daemon",
        rpc_address = %client.base_url(),
        provider = %config.provider,
        interval_secs = config.interval.as_secs()
    );

    match unlock_when_ready(&client, &password, config.interval)
        .await
        .context("error while unlocking wallet")?
    {
        UnlockOutcome::Unlocked => tdex_telemetry::log_event!(info, "unlocker", "done"),
        UnlockOutcome::AlreadyUnlocked => {
            tdex_telemetry::log_event!(info, "unlocker", "done, wallet was already unlocked")
        }
    }
    Ok(())
}
