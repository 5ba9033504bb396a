//! # Domain Errors
//!
//! Error taxonomy for the blockchain listener.
//!
//! | Error | Scope | Listener reaction |
//! |-------|-------|-------------------|
//! | `OracleError` | one utxo | skip the utxo, keep the batch |
//! | `StoreError` | one event | discard the unit of work |
//! | `CommitError` | one event | log, effects not guaranteed |
//! | `MarketError` | domain transition | surfaced through `StoreError::Market` |

use thiserror::Error;

/// Transaction identifier (hex encoded).
pub type Txid = String;

/// Asset identifier (hex encoded asset hash).
pub type AssetHash = String;

/// Confidential or unconfidential address string.
pub type Address = String;

/// Market state transition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Funding requires at least one outpoint.
    #[error("Market {account_index} cannot be funded without outpoints")]
    EmptyFundingOutpoints {
        /// Account index of the market
        account_index: u32,
    },

    /// Funding outpoints carry only the base asset.
    #[error("Market {account_index} funding is missing a quote asset")]
    MissingQuoteAsset {
        /// Account index of the market
        account_index: u32,
    },

    /// Only funded markets can be opened for trading.
    #[error("Market {account_index} is not funded")]
    NotFunded {
        /// Account index of the market
        account_index: u32,
    },
}

/// Ledger / market / vault store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No market with the given quote asset.
    #[error("Market not found for quote asset {0}")]
    MarketNotFound(AssetHash),

    /// No market at the given account index.
    #[error("Market not found for account index {0}")]
    AccountNotFound(u32),

    /// The quote asset already identifies another funded market.
    #[error("Quote asset {quote_asset} already funds market {account_index}")]
    QuoteAssetInUse {
        /// Contested quote asset
        quote_asset: AssetHash,
        /// Account index of the market holding it
        account_index: u32,
    },

    /// A market transition was rejected by the domain.
    #[error("Market update rejected: {0}")]
    Market(#[from] MarketError),

    /// Backend failure (I/O, connection, serialization).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Confirmation oracle failures (transient, per utxo).
#[derive(Debug, Error)]
pub enum OracleError {
    /// Explorer request failed.
    #[error("Explorer request failed: {0}")]
    Request(String),

    /// Explorer does not know the transaction.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Txid),

    /// Explorer answered with an unexpected payload.
    #[error("Invalid explorer response: {0}")]
    Decode(String),
}

/// Unit-of-work commit failures.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Another writer committed since the unit of work was opened.
    #[error("Commit conflict: opened at version {expected}, store is at {found}")]
    Conflict {
        /// Version the unit of work was based on
        expected: u64,
        /// Version found at commit time
        found: u64,
    },

    /// Backend failed to apply the writes.
    #[error("Commit failed: {0}")]
    Backend(String),
}

/// Listener-level errors (wiring, configuration).
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The event stream has a single reader and was already taken.
    #[error("Event stream already subscribed")]
    EventStreamTaken,

    /// The event source was stopped and accepts no more events.
    #[error("Event source closed")]
    SourceClosed,

    /// The event source failed to start.
    #[error("Event source failed to start: {0}")]
    SourceStart(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_error_in_store_error() {
        let err: StoreError = MarketError::NotFunded { account_index: 7 }.into();
        assert!(err.to_string().contains("not funded"));
        assert!(matches!(err, StoreError::Market(_)));
    }

    #[test]
    fn test_commit_conflict_message() {
        let err = CommitError::Conflict {
            expected: 3,
            found: 4,
        };
        assert!(err.to_string().contains("version 3"));
        assert!(err.to_string().contains("at 4"));
    }

    #[test]
    fn test_oracle_not_found() {
        let err = OracleError::TransactionNotFound("ab".repeat(32));
        assert!(err.to_string().contains("not found"));
    }
}
