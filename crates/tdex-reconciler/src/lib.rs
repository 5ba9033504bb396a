//! # TDEX Reconciler
//!
//! Blockchain event reconciliation engine of the trading daemon.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Watch the daemon's fee and market accounts for deposits and keep the
//! ledger of unspent outputs and the market state consistent with what the
//! chain shows:
//! - confirmed deposits become `Unspent` records (idempotent by `txid:vout`)
//! - the first deposit to a market account funds that market
//! - every fee-account deposit re-evaluates whether markets may trade
//!
//! ## Event Handling
//!
//! | Failure | Scope | Reaction |
//! |---------|-------|----------|
//! | Oracle error | one utxo | skipped, batch continues |
//! | Store error | one event | unit of work discarded |
//! | Commit error | one event | logged |
//!
//! No failure stops the consumer task; it runs until the event stream closes.
//!
//! ## Module Structure
//!
//! ```text
//! tdex-reconciler/
//! ├── domain/          # Unspent, Market, errors, liquidity gating
//! ├── events/          # BlockchainEvent notifications
//! ├── ports/           # BlockchainListenerApi (inbound) + stores/oracle/source (outbound)
//! ├── application/     # BlockchainListener
//! ├── adapters/        # In-memory storage, channel source, Esplora oracle
//! ├── config.rs        # ReconcilerConfig
//! └── metrics.rs       # Prometheus metrics (feature = "metrics")
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;

// Re-exports
pub use adapters::{
    ChannelEventSource, EsploraConfirmationOracle, EventPublisher, InMemoryDb,
    InMemoryMarketRepository, InMemoryTx, InMemoryUnspentRepository, InMemoryVaultRepository,
    LedgerState, StaticConfirmationOracle, DEFAULT_EXPLORER_TIMEOUT,
};
pub use application::{BlockchainListener, ListenerDeps};
pub use config::ReconcilerConfig;
pub use domain::{
    evaluate_liquidity, AccountKind, CommitError, EventOutcome, Liquidity, ListenerStats, Market,
    MarketError, OracleError, OutpointWithAsset, ReconcilerError, StoreError, Unspent, UnspentKey,
    DEFAULT_FEE_BALANCE_THRESHOLD, FEE_ACCOUNT, LBTC_ASSET, MARKET_ACCOUNT_START,
};
pub use events::{BlockchainEvent, EventKind, UtxoNotice};
pub use ports::{
    BlockchainListenerApi, ConfirmationOracle, EventSource, EventStream, MarketRepository,
    MarketUpdate, UnitOfWork, UnitOfWorkManager, UnspentRepository, VaultRepository,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
