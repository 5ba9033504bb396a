//! # Daemon Runtime
//!
//! Wires the blockchain listener for a running daemon.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (env)
//! 2. Build in-memory storage and register the fee account addresses
//! 3. Build the confirmation oracle (Esplora)
//! 4. Start the event source and spawn the listener
//! 5. On shutdown, stop the source and wait for the listener to drain

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::info;

use tdex_reconciler::{
    AccountKind, BlockchainListener, ChannelEventSource, ConfirmationOracle,
    EsploraConfirmationOracle, EventPublisher, InMemoryDb, InMemoryVaultRepository, LedgerState,
    ListenerDeps, ListenerStats,
};

pub use config::{load_config, DaemonConfig, ExplorerConfig};

/// Running listener with its collaborators.
pub struct DaemonRuntime {
    db: InMemoryDb,
    vault: InMemoryVaultRepository,
    source: Arc<ChannelEventSource>,
    listener: Arc<BlockchainListener<InMemoryDb>>,
    handle: Option<JoinHandle<ListenerStats>>,
}

impl DaemonRuntime {
    /// Runtime using the Esplora explorer from `config`.
    pub fn new(config: DaemonConfig) -> Result<Self> {
        let oracle = EsploraConfirmationOracle::new(&config.explorer.url, config.explorer.timeout())
            .context("error while setting up explorer client")?;
        info!(explorer = %oracle.base_url(), "Explorer confirmation oracle configured");
        Ok(Self::with_oracle(config, Arc::new(oracle)))
    }

    /// Runtime using the given confirmation oracle.
    pub fn with_oracle(config: DaemonConfig, oracle: Arc<dyn ConfirmationOracle>) -> Self {
        let db = InMemoryDb::new();
        let vault = InMemoryVaultRepository::new();
        for address in &config.fee_addresses {
            vault.register_address(AccountKind::Fee, address.clone());
        }

        let source = Arc::new(ChannelEventSource::new());
        let deps = ListenerDeps::in_memory(
            db.clone(),
            &config.reconciler.base_asset,
            vault.clone(),
            oracle,
            source.clone(),
        );
        let listener = Arc::new(BlockchainListener::new(config.reconciler, deps));

        Self {
            db,
            vault,
            source,
            listener,
            handle: None,
        }
    }

    /// Start observing the blockchain.
    pub fn start(&mut self) -> Result<()> {
        let handle = Arc::clone(&self.listener)
            .observe_blockchain()
            .context("error while starting the blockchain listener")?;
        self.handle = Some(handle);
        info!("Blockchain listener started");
        Ok(())
    }

    /// Producer handle for the address watcher.
    pub fn publisher(&self) -> Result<EventPublisher> {
        Ok(self.source.publisher()?)
    }

    /// Account index shared with the listener.
    pub fn vault(&self) -> &InMemoryVaultRepository {
        &self.vault
    }

    /// Committed ledger and market state.
    pub fn snapshot(&self) -> LedgerState {
        self.db.snapshot()
    }

    /// Stop the source and wait for the listener to finish pending events.
    ///
    /// Returns `None` if the listener was never started.
    pub async fn shutdown(mut self) -> Result<Option<ListenerStats>> {
        info!("Initiating graceful shutdown...");
        self.source.stop();

        let Some(handle) = self.handle.take() else {
            return Ok(None);
        };
        let stats = handle.await.context("blockchain listener task failed")?;
        info!(
            events = stats.events,
            committed = stats.committed,
            discarded = stats.discarded,
            "Shutdown complete"
        );
        Ok(Some(stats))
    }
}
