//! # TDEX Unlocker
//!
//! Companion process that unlocks the daemon's wallet.
//!
//! It polls the daemon's `is_ready` endpoint at a fixed interval until the
//! wallet is initialized, then sends the password sourced from a provider
//! exactly once, unless the wallet is already unlocked.
//!
//! ```text
//! tdex-unlocker/
//! ├── config.rs     # Flags and validation
//! ├── provider.rs   # PasswordProvider + FileProvider
//! ├── client.rs     # WalletUnlocker port + HTTP gateway client
//! └── unlock.rs     # unlock_when_ready loop
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod unlock;

pub use client::{HttpWalletUnlocker, WalletStatus, WalletUnlocker};
pub use config::{Args, ProviderKind, UnlockerConfig};
pub use error::UnlockerError;
pub use provider::{new_provider, FileProvider, Password, PasswordProvider};
pub use unlock::{unlock_when_ready, UnlockOutcome};
