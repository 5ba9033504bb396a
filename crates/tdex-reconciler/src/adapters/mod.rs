//! # Adapters
//!
//! Concrete implementations of the outbound ports.

pub mod esplora;
pub mod event_source;
pub mod oracle;
pub mod storage;

pub use esplora::{EsploraConfirmationOracle, DEFAULT_EXPLORER_TIMEOUT};
pub use event_source::{ChannelEventSource, EventPublisher};
pub use oracle::StaticConfirmationOracle;
pub use storage::{
    InMemoryDb, InMemoryMarketRepository, InMemoryTx, InMemoryUnspentRepository,
    InMemoryVaultRepository, LedgerState,
};
