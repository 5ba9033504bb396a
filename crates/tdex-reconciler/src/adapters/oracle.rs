//! Table-driven confirmation oracle for tests and local runs.

use crate::domain::{OracleError, Txid};
use crate::ports::outbound::ConfirmationOracle;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Oracle answering from a fixed table of transaction ids.
///
/// Unknown txids answer `default_confirmed`.
#[derive(Debug, Default)]
pub struct StaticConfirmationOracle {
    answers: RwLock<HashMap<Txid, bool>>,
    failing: RwLock<HashSet<Txid>>,
    default_confirmed: bool,
}

impl StaticConfirmationOracle {
    /// Oracle treating every unknown transaction as confirmed.
    pub fn confirming_all() -> Self {
        Self {
            default_confirmed: true,
            ..Self::default()
        }
    }

    pub fn with_confirmed(self, txid: impl Into<Txid>) -> Self {
        self.set_confirmed(txid, true);
        self
    }

    pub fn with_unconfirmed(self, txid: impl Into<Txid>) -> Self {
        self.set_confirmed(txid, false);
        self
    }

    /// Make lookups for `txid` fail with `OracleError::Request`.
    pub fn with_failure(self, txid: impl Into<Txid>) -> Self {
        self.failing.write().insert(txid.into());
        self
    }

    pub fn set_confirmed(&self, txid: impl Into<Txid>, confirmed: bool) {
        let txid = txid.into();
        self.failing.write().remove(&txid);
        self.answers.write().insert(txid, confirmed);
    }
}

#[async_trait]
impl ConfirmationOracle for StaticConfirmationOracle {
    async fn is_transaction_confirmed(&self, txid: &str) -> Result<bool, OracleError> {
        if self.failing.read().contains(txid) {
            return Err(OracleError::Request(format!("lookup of {} failed", txid)));
        }
        Ok(self
            .answers
            .read()
            .get(txid)
            .copied()
            .unwrap_or(self.default_confirmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_table_lookup() {
        let oracle = StaticConfirmationOracle::default()
            .with_confirmed("a")
            .with_unconfirmed("b")
            .with_failure("c");

        assert!(oracle.is_transaction_confirmed("a").await.unwrap());
        assert!(!oracle.is_transaction_confirmed("b").await.unwrap());
        assert!(oracle.is_transaction_confirmed("c").await.is_err());
        assert!(!oracle.is_transaction_confirmed("zzz").await.unwrap());
    }

    #[tokio::test]
    async fn test_confirming_all_and_recovery() {
        let oracle = StaticConfirmationOracle::confirming_all().with_failure("flaky");
        assert!(oracle.is_transaction_confirmed("anything").await.unwrap());
        assert!(oracle.is_transaction_confirmed("flaky").await.is_err());

        oracle.set_confirmed("flaky", true);
        assert!(oracle.is_transaction_confirmed("flaky").await.unwrap());
    }
}
