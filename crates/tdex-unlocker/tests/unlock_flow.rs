//! # Unlock Flow Tests
//!
//! `unlock_when_ready` against a scripted daemon.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tdex_unlocker::{
    unlock_when_ready, Password, UnlockOutcome, UnlockerError, WalletStatus, WalletUnlocker,
};

/// Daemon answering `is_ready` from a script; the last answer repeats.
struct ScriptedDaemon {
    statuses: Mutex<VecDeque<Result<WalletStatus, UnlockerError>>>,
    polls: Mutex<u32>,
    unlocks: Mutex<Vec<String>>,
    reject_unlock: bool,
}

impl ScriptedDaemon {
    fn new(statuses: Vec<Result<WalletStatus, UnlockerError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            polls: Mutex::new(0),
            unlocks: Mutex::new(Vec::new()),
            reject_unlock: false,
        }
    }

    fn polls(&self) -> u32 {
        *self.polls.lock().unwrap()
    }

    fn unlocks(&self) -> Vec<String> {
        self.unlocks.lock().unwrap().clone()
    }
}

fn status(initialized: bool, unlocked: bool) -> Result<WalletStatus, UnlockerError> {
    Ok(WalletStatus {
        initialized,
        unlocked,
    })
}

#[async_trait]
impl WalletUnlocker for ScriptedDaemon {
    async fn is_ready(&self) -> Result<WalletStatus, UnlockerError> {
        *self.polls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            match statuses.front().unwrap() {
                Ok(status) => Ok(*status),
                Err(e) => Err(UnlockerError::Transport(e.to_string())),
            }
        }
    }

    async fn unlock_wallet(&self, password: &Password) -> Result<(), UnlockerError> {
        if self.reject_unlock {
            return Err(UnlockerError::Rpc {
                status: 400,
                message: "invalid password".to_string(),
            });
        }
        self.unlocks
            .lock()
            .unwrap()
            .push(password.expose().to_string());
        Ok(())
    }
}

const INTERVAL: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn test_polls_until_initialized_then_unlocks_once() {
    let daemon = ScriptedDaemon::new(vec![
        status(false, false),
        status(false, false),
        status(true, false),
    ]);
    let started = tokio::time::Instant::now();

    let outcome = unlock_when_ready(&daemon, &Password::new("pw"), INTERVAL)
        .await
        .unwrap();

    assert_eq!(outcome, UnlockOutcome::Unlocked);
    assert_eq!(daemon.polls(), 3);
    assert_eq!(daemon.unlocks(), vec!["pw".to_string()]);
    assert!(started.elapsed() >= INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn test_already_unlocked_wallet_is_left_alone() {
    let daemon = ScriptedDaemon::new(vec![status(true, true)]);

    let outcome = unlock_when_ready(&daemon, &Password::new("pw"), INTERVAL)
        .await
        .unwrap();

    assert_eq!(outcome, UnlockOutcome::AlreadyUnlocked);
    assert_eq!(daemon.polls(), 1);
    assert!(daemon.unlocks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unlock_decision_uses_latest_status() {
    // unlocked by someone else while we were waiting for initialization
    let daemon = ScriptedDaemon::new(vec![status(false, false), status(true, true)]);

    let outcome = unlock_when_ready(&daemon, &Password::new("pw"), INTERVAL)
        .await
        .unwrap();

    assert_eq!(outcome, UnlockOutcome::AlreadyUnlocked);
    assert!(daemon.unlocks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_status_error_aborts() {
    let daemon = ScriptedDaemon::new(vec![
        status(false, false),
        Err(UnlockerError::Transport("connection refused".to_string())),
    ]);

    let result = unlock_when_ready(&daemon, &Password::new("pw"), INTERVAL).await;

    assert!(matches!(result, Err(UnlockerError::Transport(_))));
    assert!(daemon.unlocks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_unlock_is_reported() {
    let mut daemon = ScriptedDaemon::new(vec![status(true, false)]);
    daemon.reject_unlock = true;

    let result = unlock_when_ready(&daemon, &Password::new("wrong"), INTERVAL).await;
    assert!(matches!(result, Err(UnlockerError::Rpc { status: 400, .. })));
}

#[test]
fn test_unlock_loop_runs_on_blocking_executor() {
    let daemon = ScriptedDaemon::new(vec![status(true, false)]);
    let outcome = tokio_test::block_on(unlock_when_ready(
        &daemon,
        &Password::new("pw"),
        Duration::from_millis(1),
    ))
    .unwrap();
    assert_eq!(outcome, UnlockOutcome::Unlocked);
}
