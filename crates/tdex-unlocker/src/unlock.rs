//! Wait-then-unlock loop.

use crate::client::WalletUnlocker;
use crate::error::UnlockerError;
use crate::provider::Password;
use std::time::Duration;
use tracing::info;

/// How `unlock_when_ready` finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The wallet was unlocked by this run.
    Unlocked,
    /// The wallet was already unlocked; nothing was sent.
    AlreadyUnlocked,
}

/// Poll `is_ready` every `interval` until the wallet is initialized, then
/// unlock it once unless it is already unlocked.
///
/// Any RPC failure ends the loop with that error.
pub async fn unlock_when_ready(
    client: &dyn WalletUnlocker,
    password: &Password,
    interval: Duration,
) -> Result<UnlockOutcome, UnlockerError> {
    let mut status = client.is_ready().await?;
    if !status.initialized {
        info!("waiting for the wallet to be initialized");
    }
    while !status.initialized {
        tokio::time::sleep(interval).await;
        status = client.is_ready().await?;
    }
    info!("wallet initialized");

    if status.unlocked {
        info!("wallet is already unlocked, nothing left to do");
        return Ok(UnlockOutcome::AlreadyUnlocked);
    }

    info!("attempting to unlock it with provided password...");
    client.unlock_wallet(password).await?;
    info!("wallet unlocked successfully");
    Ok(UnlockOutcome::Unlocked)
}
