//! Wallet unlocker client.
//!
//! The daemon exposes its wallet-unlocker service through a JSON gateway:
//!
//! | Method | Path | Body | Reply |
//! |--------|------|------|-------|
//! | `GET` | `/v1/isready` | - | `{"initialized": bool, "unlocked": bool}` |
//! | `POST` | `/v1/wallet/unlock` | `{"wallet_password": str}` | `{}` |

use crate::error::UnlockerError;
use crate::provider::Password;
use async_trait::async_trait;
use reqwest::{Certificate, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wallet state reported by the daemon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    /// Wallet created or restored.
    #[serde(default)]
    pub initialized: bool,
    /// Wallet unlocked with its password.
    #[serde(default)]
    pub unlocked: bool,
}

/// Daemon's wallet-unlocker service.
#[async_trait]
pub trait WalletUnlocker: Send + Sync {
    /// Current wallet state.
    async fn is_ready(&self) -> Result<WalletStatus, UnlockerError>;

    /// Unlock the wallet.
    async fn unlock_wallet(&self, password: &Password) -> Result<(), UnlockerError>;
}

#[derive(Serialize)]
struct UnlockWalletRequest<'a> {
    wallet_password: &'a str,
}

/// `WalletUnlocker` over the daemon's HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpWalletUnlocker {
    client: Client,
    base_url: String,
}

impl HttpWalletUnlocker {
    /// Client for the daemon at `rpc_address` (`host:port`).
    ///
    /// With a PEM certificate the connection uses TLS and trusts that
    /// certificate; otherwise it is plaintext.
    pub fn new(rpc_address: &str, tls_certificate: &[u8]) -> Result<Self, UnlockerError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(2));

        let scheme = if tls_certificate.is_empty() {
            "http"
        } else {
            let cert = Certificate::from_pem(tls_certificate).map_err(|e| {
                UnlockerError::Transport(format!("credentials: failed to append certificates: {}", e))
            })?;
            builder = builder.add_root_certificate(cert);
            "https"
        };

        let client = builder
            .build()
            .map_err(|e| UnlockerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}://{}", scheme, rpc_address),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response) -> Result<String, UnlockerError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UnlockerError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(UnlockerError::Rpc {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

/// Decode an `is_ready` reply.
pub fn parse_status(body: &str) -> Result<WalletStatus, UnlockerError> {
    serde_json::from_str(body).map_err(|e| UnlockerError::Decode(e.to_string()))
}

#[async_trait]
impl WalletUnlocker for HttpWalletUnlocker {
    async fn is_ready(&self) -> Result<WalletStatus, UnlockerError> {
        let response = self
            .client
            .get(format!("{}/v1/isready", self.base_url))
            .send()
            .await
            .map_err(|e| UnlockerError::Transport(e.to_string()))?;
        parse_status(&Self::check(response).await?)
    }

    async fn unlock_wallet(&self, password: &Password) -> Result<(), UnlockerError> {
        let response = self
            .client
            .post(format!("{}/v1/wallet/unlock", self.base_url))
            .json(&UnlockWalletRequest {
                wallet_password: password.expose(),
            })
            .send()
            .await
            .map_err(|e| UnlockerError::Transport(e.to_string()))?;
        Self::check(response).await.map(|_| ())
    }
}
