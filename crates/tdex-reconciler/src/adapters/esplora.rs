//! Explorer-backed confirmation oracle.
//!
//! Talks to an Esplora-compatible REST API:
//! `GET {base_url}/tx/{txid}/status` answers
//! `{"confirmed": bool, "block_height": u64?, "block_hash": str?}`.

use crate::domain::OracleError;
use crate::ports::outbound::ConfirmationOracle;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default explorer request timeout.
pub const DEFAULT_EXPLORER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TxStatus {
    confirmed: bool,
    #[serde(default)]
    block_height: Option<u64>,
}

fn parse_status(body: &str) -> Result<TxStatus, OracleError> {
    serde_json::from_str(body).map_err(|e| OracleError::Decode(e.to_string()))
}

/// Confirmation oracle querying an Esplora explorer.
#[derive(Debug, Clone)]
pub struct EsploraConfirmationOracle {
    client: Client,
    base_url: String,
}

impl EsploraConfirmationOracle {
    /// Create an oracle for the explorer at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| OracleError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status_url(&self, txid: &str) -> String {
        format!("{}/tx/{}/status", self.base_url, txid)
    }
}

#[async_trait]
impl ConfirmationOracle for EsploraConfirmationOracle {
    async fn is_transaction_confirmed(&self, txid: &str) -> Result<bool, OracleError> {
        let response = self
            .client
            .get(self.status_url(txid))
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(OracleError::TransactionNotFound(txid.to_string())),
            status if !status.is_success() => {
                return Err(OracleError::Request(format!(
                    "explorer answered {} for {}",
                    status, txid
                )))
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;
        let status = parse_status(&body)?;

        debug!(
            txid = %txid,
            confirmed = status.confirmed,
            block_height = ?status.block_height,
            "[oracle] transaction status"
        );
        Ok(status.confirmed)
    }
}
