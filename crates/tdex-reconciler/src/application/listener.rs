//! # Blockchain Listener
//!
//! Application service reconciling deposit notifications with the ledger
//! and market state.
//!
//! One event is handled at a time, inside its own unit of work:
//!
//! ```text
//! event ──→ begin ──→ confirm utxos ──→ persist ──→ market step ──→ commit
//!                          │ oracle error: skip utxo    │ store error: discard
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapters::{
    InMemoryDb, InMemoryMarketRepository, InMemoryUnspentRepository, InMemoryVaultRepository,
};
use crate::config::ReconcilerConfig;
use crate::domain::{
    evaluate_liquidity, AccountKind, EventOutcome, Liquidity, ListenerStats, Market,
    ReconcilerError, StoreError, Unspent,
};
use crate::events::{BlockchainEvent, UtxoNotice};
use crate::metrics;
use crate::ports::{
    BlockchainListenerApi, ConfirmationOracle, EventSource, EventStream, MarketRepository,
    UnitOfWork, UnitOfWorkManager, UnspentRepository, VaultRepository,
};

/// Collaborators of the blockchain listener.
pub struct ListenerDeps<M: UnitOfWorkManager> {
    /// Unit-of-work manager shared by the repositories.
    pub uow: Arc<M>,
    /// Ledger store.
    pub unspents: Arc<dyn UnspentRepository<M::Tx>>,
    /// Market store.
    pub markets: Arc<dyn MarketRepository<M::Tx>>,
    /// Account index.
    pub vault: Arc<dyn VaultRepository<M::Tx>>,
    /// Confirmation oracle.
    pub oracle: Arc<dyn ConfirmationOracle>,
    /// Address watcher.
    pub source: Arc<dyn EventSource>,
}

impl ListenerDeps<InMemoryDb> {
    /// Wire the in-memory storage adapters around `db`.
    pub fn in_memory(
        db: InMemoryDb,
        base_asset: &str,
        vault: InMemoryVaultRepository,
        oracle: Arc<dyn ConfirmationOracle>,
        source: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            uow: Arc::new(db),
            unspents: Arc::new(InMemoryUnspentRepository::new()),
            markets: Arc::new(InMemoryMarketRepository::new(base_asset)),
            vault: Arc::new(vault),
            oracle,
            source,
        }
    }
}

/// Utxos that passed the confirmation step.
struct ConfirmedBatch {
    unspents: Vec<Unspent>,
    skipped: usize,
}

/// Market and ledger changes made by one event.
///
/// Published to metrics only once the unit of work commits.
#[derive(Debug, Default, PartialEq, Eq)]
struct EventEffects {
    skipped_utxos: usize,
    unspents_added: usize,
    markets_opened: usize,
    markets_closed: usize,
    market_funded: bool,
    fee_balance: Option<u64>,
}

impl EventEffects {
    fn record(&self) {
        metrics::record_unspents_added(self.unspents_added);
        if self.markets_opened > 0 {
            metrics::record_market_transitions("open", self.markets_opened);
        }
        if self.markets_closed > 0 {
            metrics::record_market_transitions("close", self.markets_closed);
        }
        if self.market_funded {
            metrics::record_market_funded();
        }
        if let Some(balance) = self.fee_balance {
            metrics::set_fee_account_balance(balance);
        }
    }
}

/// Blockchain listener - reconciliation engine.
pub struct BlockchainListener<M: UnitOfWorkManager> {
    config: ReconcilerConfig,
    uow: Arc<M>,
    unspents: Arc<dyn UnspentRepository<M::Tx>>,
    markets: Arc<dyn MarketRepository<M::Tx>>,
    vault: Arc<dyn VaultRepository<M::Tx>>,
    oracle: Arc<dyn ConfirmationOracle>,
    source: Arc<dyn EventSource>,
}

impl<M: UnitOfWorkManager + 'static> BlockchainListener<M> {
    pub fn new(config: ReconcilerConfig, deps: ListenerDeps<M>) -> Self {
        Self {
            config,
            uow: deps.uow,
            unspents: deps.unspents,
            markets: deps.markets,
            vault: deps.vault,
            oracle: deps.oracle,
            source: deps.source,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Start the event source and spawn the consumer task.
    ///
    /// The returned handle resolves with the run's statistics once the
    /// event stream closes.
    pub fn observe_blockchain(
        self: Arc<Self>,
    ) -> Result<JoinHandle<ListenerStats>, ReconcilerError> {
        self.source.start()?;
        let events = self.source.events()?;
        info!(
            base_asset = %self.config.base_asset,
            threshold = self.config.fee_balance_threshold,
            "[listener] observing blockchain"
        );
        Ok(tokio::spawn(async move { self.run(events).await }))
    }

    /// Query the oracle for every utxo, one at a time.
    ///
    /// Oracle failures skip the utxo; unconfirmed utxos are dropped for this
    /// pass and expected to be announced again.
    async fn confirm_utxos(&self, address: &str, utxos: &[UtxoNotice]) -> ConfirmedBatch {
        let mut unspents = Vec::with_capacity(utxos.len());
        let mut skipped = 0;

        for utxo in utxos {
            match self.oracle.is_transaction_confirmed(&utxo.txid).await {
                Ok(true) => unspents.push(utxo.to_unspent(address, true)),
                Ok(false) => {
                    debug!(txid = %utxo.txid, vout = utxo.vout, "[listener] utxo not confirmed yet");
                }
                Err(e) => {
                    warn!(
                        txid = %utxo.txid,
                        vout = utxo.vout,
                        error = %e,
                        "[listener] unable to check utxo confirmation, skipping"
                    );
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            metrics::record_utxos_skipped(skipped);
        }
        ConfirmedBatch { unspents, skipped }
    }

    async fn persist_unspents(
        &self,
        tx: &mut M::Tx,
        unspents: Vec<Unspent>,
    ) -> Result<usize, StoreError> {
        let count = unspents.len();
        self.unspents
            .add_unspents(tx, unspents)
            .await
            .inspect_err(|e| warn!(error = %e, "[listener] unable to persist unspents"))?;
        debug!(count, "[listener] unspents persisted");
        Ok(count)
    }

    async fn fee_account_balance(&self, tx: &mut M::Tx) -> Result<u64, StoreError> {
        let addresses = self
            .vault
            .get_derived_addresses(tx, AccountKind::Fee)
            .await
            .inspect_err(|e| warn!(error = %e, "[listener] unable to get fee account addresses"))?;

        let mut balance = 0u64;
        for address in &addresses {
            let amount = self
                .unspents
                .get_balance(tx, address, &self.config.base_asset)
                .await
                .inspect_err(|e| {
                    warn!(address = %address, error = %e, "[listener] unable to get balance")
                })?;
            balance = balance.saturating_add(amount);
        }
        Ok(balance)
    }

    async fn on_fee_account_deposit(
        &self,
        tx: &mut M::Tx,
        address: &str,
        utxos: &[UtxoNotice],
    ) -> Result<EventEffects, StoreError> {
        let batch = self.confirm_utxos(address, utxos).await;
        let mut effects = EventEffects {
            skipped_utxos: batch.skipped,
            unspents_added: self.persist_unspents(tx, batch.unspents).await?,
            ..EventEffects::default()
        };

        let markets = self
            .markets
            .get_tradable_markets(tx)
            .await
            .inspect_err(|e| warn!(error = %e, "[listener] unable to get tradable markets"))?;

        let balance = self.fee_account_balance(tx).await?;
        effects.fee_balance = Some(balance);

        match evaluate_liquidity(balance, self.config.fee_balance_threshold) {
            Liquidity::Insufficient => {
                for market in &markets {
                    self.close(tx, market).await?;
                }
                effects.markets_closed = markets.len();
                warn!(
                    balance,
                    threshold = self.config.fee_balance_threshold,
                    markets = markets.len(),
                    "[listener] fee account balance too low, trading disabled"
                );
            }
            Liquidity::Sufficient => {
                for market in &markets {
                    self.open(tx, market).await?;
                }
                effects.markets_opened = markets.len();
                debug!(
                    balance,
                    markets = markets.len(),
                    "[listener] fee account liquidity sufficient"
                );
            }
        }

        Ok(effects)
    }

    async fn open(&self, tx: &mut M::Tx, market: &Market) -> Result<(), StoreError> {
        self.markets
            .open_market(tx, market.quote_asset())
            .await
            .inspect_err(|e| {
                warn!(
                    account_index = market.account_index(),
                    error = %e,
                    "[listener] unable to open market"
                )
            })
    }

    async fn close(&self, tx: &mut M::Tx, market: &Market) -> Result<(), StoreError> {
        self.markets
            .close_market(tx, market.quote_asset())
            .await
            .inspect_err(|e| {
                warn!(
                    account_index = market.account_index(),
                    error = %e,
                    "[listener] unable to close market"
                )
            })
    }

    async fn on_market_account_deposit(
        &self,
        tx: &mut M::Tx,
        account_index: u32,
        address: &str,
        utxos: &[UtxoNotice],
    ) -> Result<EventEffects, StoreError> {
        let batch = self.confirm_utxos(address, utxos).await;
        let unspents_added = self.persist_unspents(tx, batch.unspents).await?;

        let outpoints: Vec<_> = utxos.iter().map(UtxoNotice::to_outpoint).collect();

        let market = self
            .markets
            .get_or_create_market(tx, account_index)
            .await
            .inspect_err(|e| {
                error!(account_index, error = %e, "[listener] unable to retrieve market")
            })?;
        let was_funded = market.is_funded();

        self.markets
            .update_market(
                tx,
                account_index,
                Box::new(move |mut market: Market| {
                    market.fund_market(outpoints)?;
                    Ok(market)
                }),
            )
            .await
            .inspect_err(|e| {
                warn!(account_index, error = %e, "[listener] unable to update market")
            })?;

        if was_funded {
            debug!(account_index, "[listener] market already funded");
        } else {
            info!(account_index, "[listener] market funded");
        }

        Ok(EventEffects {
            skipped_utxos: batch.skipped,
            unspents_added,
            market_funded: !was_funded,
            ..EventEffects::default()
        })
    }

    async fn dispatch(
        &self,
        tx: &mut M::Tx,
        event: BlockchainEvent,
    ) -> Result<EventEffects, StoreError> {
        match event {
            BlockchainEvent::FeeAccountDeposit { address, utxos } => {
                self.on_fee_account_deposit(tx, &address, &utxos).await
            }
            BlockchainEvent::MarketAccountDeposit {
                account_index,
                address,
                utxos,
            } => {
                self.on_market_account_deposit(tx, account_index, &address, &utxos)
                    .await
            }
            BlockchainEvent::TransactionConfirmed { txid } => {
                debug!(txid = %txid, "[listener] transaction confirmed");
                Ok(EventEffects::default())
            }
        }
    }
}

#[async_trait]
impl<M: UnitOfWorkManager + 'static> BlockchainListenerApi for BlockchainListener<M> {
    async fn handle_event(&self, event: BlockchainEvent) -> EventOutcome {
        let kind = event.kind();
        let correlation_id = Uuid::new_v4();
        let span = info_span!("listener_event", %correlation_id, kind = %kind);

        let outcome = async {
            let mut tx = match self.uow.begin().await {
                Ok(tx) => tx,
                Err(e) => {
                    error!(error = %e, "[listener] unable to begin unit of work");
                    return EventOutcome::Discarded {
                        reason: e.to_string(),
                    };
                }
            };

            match self.dispatch(&mut tx, event).await {
                Ok(effects) => match tx.commit().await {
                    Ok(()) => {
                        effects.record();
                        EventOutcome::Committed {
                            skipped_utxos: effects.skipped_utxos,
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "[listener] unable to commit unit of work");
                        EventOutcome::CommitFailed {
                            reason: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    tx.discard().await;
                    EventOutcome::Discarded {
                        reason: e.to_string(),
                    }
                }
            }
        }
        .instrument(span)
        .await;

        metrics::record_event(kind.as_str(), outcome.label());
        outcome
    }

    async fn run(&self, mut events: EventStream) -> ListenerStats {
        let mut stats = ListenerStats::default();

        while let Some(event) = events.recv().await {
            let outcome = self.handle_event(event).await;
            stats.record(&outcome);
        }

        info!(
            events = stats.events,
            committed = stats.committed,
            discarded = stats.discarded,
            commit_failed = stats.commit_failed,
            skipped_utxos = stats.skipped_utxos,
            "[listener] event stream closed"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChannelEventSource, StaticConfirmationOracle};
    use crate::domain::UnspentKey;

    fn listener(
        db: &InMemoryDb,
        oracle: StaticConfirmationOracle,
        vault: InMemoryVaultRepository,
    ) -> BlockchainListener<InMemoryDb> {
        let config = ReconcilerConfig::for_testing();
        let deps = ListenerDeps::in_memory(
            db.clone(),
            &config.base_asset,
            vault,
            Arc::new(oracle),
            Arc::new(ChannelEventSource::new()),
        );
        BlockchainListener::new(config, deps)
    }

    #[tokio::test]
    async fn test_confirm_utxos_partitions_batch() {
        let db = InMemoryDb::new();
        let oracle = StaticConfirmationOracle::default()
            .with_confirmed("ok")
            .with_unconfirmed("pending")
            .with_failure("broken");
        let listener = listener(&db, oracle, InMemoryVaultRepository::new());

        let batch = listener
            .confirm_utxos(
                "addr",
                &[
                    UtxoNotice::new("broken", "lbtc", 0, 1),
                    UtxoNotice::new("pending", "lbtc", 0, 2),
                    UtxoNotice::new("ok", "lbtc", 1, 3),
                ],
            )
            .await;

        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.unspents.len(), 1);
        assert_eq!(batch.unspents[0].key(), UnspentKey::new("ok", 1));
        assert_eq!(batch.unspents[0].address, "addr");
        assert!(batch.unspents[0].confirmed);
    }

    #[tokio::test]
    async fn test_dispatch_reports_effects_before_commit() {
        let db = InMemoryDb::new();
        let vault = InMemoryVaultRepository::new().with_address(AccountKind::Fee, "fee");
        let listener = listener(&db, StaticConfirmationOracle::confirming_all(), vault);
        let deposit = BlockchainEvent::MarketAccountDeposit {
            account_index: 5,
            address: "mkt".to_string(),
            utxos: vec![UtxoNotice::new("m1", "usdt", 0, 500)],
        };

        let mut tx = db.begin_tx();
        let funded = listener.dispatch(&mut tx, deposit.clone()).await.unwrap();
        assert_eq!(
            funded,
            EventEffects {
                unspents_added: 1,
                market_funded: true,
                ..EventEffects::default()
            }
        );

        let redelivered = listener.dispatch(&mut tx, deposit).await.unwrap();
        assert!(!redelivered.market_funded);

        let gated = listener
            .dispatch(
                &mut tx,
                BlockchainEvent::FeeAccountDeposit {
                    address: "fee".to_string(),
                    utxos: vec![UtxoNotice::new("f1", "lbtc", 0, 100_000)],
                },
            )
            .await
            .unwrap();
        assert_eq!(gated.markets_opened, 1);
        assert_eq!(gated.markets_closed, 0);
        assert_eq!(gated.fee_balance, Some(100_000));

        // nothing is visible until the unit of work commits
        tx.discard().await;
        assert!(db.snapshot().market(5).is_none());
    }

    #[tokio::test]
    async fn test_transaction_confirmed_commits_without_effects() {
        let db = InMemoryDb::new();
        let listener = listener(
            &db,
            StaticConfirmationOracle::confirming_all(),
            InMemoryVaultRepository::new(),
        );
        let before = db.snapshot();

        let outcome = listener
            .handle_event(BlockchainEvent::TransactionConfirmed {
                txid: "t1".to_string(),
            })
            .await;

        assert_eq!(outcome, EventOutcome::Committed { skipped_utxos: 0 });
        assert_eq!(db.snapshot(), before);
        assert_eq!(db.version(), 1);
    }

    #[tokio::test]
    async fn test_empty_fee_deposit_still_gates_markets() {
        let db = InMemoryDb::new();
        let vault = InMemoryVaultRepository::new().with_address(AccountKind::Fee, "fee");
        let listener = listener(&db, StaticConfirmationOracle::confirming_all(), vault);

        listener
            .handle_event(BlockchainEvent::MarketAccountDeposit {
                account_index: 5,
                address: "mkt".to_string(),
                utxos: vec![UtxoNotice::new("m1", "usdt", 0, 500)],
            })
            .await;
        listener
            .handle_event(BlockchainEvent::FeeAccountDeposit {
                address: "fee".to_string(),
                utxos: vec![UtxoNotice::new("f1", "lbtc", 0, 100_000)],
            })
            .await;
        assert!(db.snapshot().market(5).unwrap().is_tradable());

        db.mark_spent(&[UnspentKey::new("f1", 0)]);
        let outcome = listener
            .handle_event(BlockchainEvent::FeeAccountDeposit {
                address: "fee".to_string(),
                utxos: vec![],
            })
            .await;

        assert!(outcome.is_committed());
        assert!(!db.snapshot().market(5).unwrap().is_tradable());
    }

    #[tokio::test]
    async fn test_market_deposit_without_utxos_is_discarded() {
        let db = InMemoryDb::new();
        let listener = listener(
            &db,
            StaticConfirmationOracle::confirming_all(),
            InMemoryVaultRepository::new(),
        );

        let outcome = listener
            .handle_event(BlockchainEvent::MarketAccountDeposit {
                account_index: 7,
                address: "mkt".to_string(),
                utxos: vec![],
            })
            .await;

        assert!(matches!(outcome, EventOutcome::Discarded { .. }));
        // lazily created market is rolled back with the rest of the event
        assert!(db.snapshot().market(7).is_none());
    }

    #[tokio::test]
    async fn test_observe_blockchain_twice_fails() {
        let db = InMemoryDb::new();
        let listener = Arc::new(listener(
            &db,
            StaticConfirmationOracle::confirming_all(),
            InMemoryVaultRepository::new(),
        ));

        let handle = Arc::clone(&listener).observe_blockchain().unwrap();
        assert!(matches!(
            Arc::clone(&listener).observe_blockchain(),
            Err(ReconcilerError::EventStreamTaken)
        ));
        handle.abort();
    }
}
