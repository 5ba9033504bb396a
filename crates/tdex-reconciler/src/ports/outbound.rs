//! # Outbound Ports
//!
//! Dependencies the blockchain listener requires from the host daemon.
//!
//! Every method that reads or writes ledger/market state takes the active
//! unit of work explicitly (`tx: &mut Tx`); nothing is looked up from an
//! ambient context.

use crate::domain::{
    AccountKind, Address, CommitError, Market, MarketError, OracleError, ReconcilerError,
    StoreError, Unspent,
};
use crate::events::BlockchainEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Live, ordered stream of blockchain events.
pub type EventStream = mpsc::UnboundedReceiver<BlockchainEvent>;

/// Read-modify-write step applied by `MarketRepository::update_market`.
pub type MarketUpdate = Box<dyn FnOnce(Market) -> Result<Market, MarketError> + Send>;

/// Address watcher producing deposit notifications.
///
/// Production: the crawler watching the daemon's derived addresses.
/// Testing: `ChannelEventSource`.
pub trait EventSource: Send + Sync {
    /// Begin background production. Must not block.
    fn start(&self) -> Result<(), ReconcilerError>;

    /// Take the event stream. The listener is its only reader, so a second
    /// call fails with `ReconcilerError::EventStreamTaken`.
    fn events(&self) -> Result<EventStream, ReconcilerError>;
}

/// Transaction confirmation oracle.
#[async_trait]
pub trait ConfirmationOracle: Send + Sync {
    /// Check if the transaction reached the confirmation threshold.
    ///
    /// May fail transiently; callers skip the item and move on.
    async fn is_transaction_confirmed(&self, txid: &str) -> Result<bool, OracleError>;
}

/// Scoped set of writes that commits or discards atomically.
///
/// Both operations consume the handle, so it cannot be reused afterwards.
#[async_trait]
pub trait UnitOfWork: Send + 'static {
    /// Durably apply every write made through this unit of work.
    async fn commit(self) -> Result<(), CommitError>;

    /// Drop every write made through this unit of work.
    async fn discard(self);
}

/// Issues units of work.
#[async_trait]
pub trait UnitOfWorkManager: Send + Sync {
    /// Unit of work handed to the repositories.
    type Tx: UnitOfWork;

    /// Open a new unit of work.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Ledger of unspent outputs.
#[async_trait]
pub trait UnspentRepository<Tx: Send>: Send + Sync {
    /// Upsert a batch of unspents keyed by `(txid, vout)`.
    ///
    /// Re-adding a known key never creates a second record.
    async fn add_unspents(&self, tx: &mut Tx, unspents: Vec<Unspent>) -> Result<(), StoreError>;

    /// Every tracked unspent.
    async fn get_all_unspents(&self, tx: &mut Tx) -> Result<Vec<Unspent>, StoreError>;

    /// Unspents neither spent nor locked.
    async fn get_available_unspents(&self, tx: &mut Tx) -> Result<Vec<Unspent>, StoreError>;

    /// Confirmed, unspent balance of `asset` held by `address`.
    async fn get_balance(&self, tx: &mut Tx, address: &str, asset: &str)
        -> Result<u64, StoreError>;

    /// Like `get_balance`, excluding locked outputs.
    async fn get_unlocked_balance(
        &self,
        tx: &mut Tx,
        address: &str,
        asset: &str,
    ) -> Result<u64, StoreError>;
}

/// Market store.
#[async_trait]
pub trait MarketRepository<Tx: Send>: Send + Sync {
    /// Market at `account_index`, created unfunded on first access.
    async fn get_or_create_market(&self, tx: &mut Tx, account_index: u32)
        -> Result<Market, StoreError>;

    /// Market at `account_index`, if any.
    async fn get_market_by_account(
        &self,
        tx: &mut Tx,
        account_index: u32,
    ) -> Result<Option<Market>, StoreError>;

    /// Markets subject to liquidity gating.
    async fn get_tradable_markets(&self, tx: &mut Tx) -> Result<Vec<Market>, StoreError>;

    /// Read-modify-write the market at `account_index`.
    async fn update_market(
        &self,
        tx: &mut Tx,
        account_index: u32,
        update: MarketUpdate,
    ) -> Result<(), StoreError>;

    /// Open the market quoted in `quote_asset`.
    async fn open_market(&self, tx: &mut Tx, quote_asset: &str) -> Result<(), StoreError>;

    /// Close the market quoted in `quote_asset`.
    async fn close_market(&self, tx: &mut Tx, quote_asset: &str) -> Result<(), StoreError>;
}

/// Read-only index of derived addresses per account.
#[async_trait]
pub trait VaultRepository<Tx: Send>: Send + Sync {
    /// Every address derived so far for `account`.
    async fn get_derived_addresses(
        &self,
        tx: &mut Tx,
        account: AccountKind,
    ) -> Result<Vec<Address>, StoreError>;
}
