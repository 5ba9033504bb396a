//! In-memory storage adapters.
//!
//! All three repositories read and write through an `InMemoryTx`, so the
//! writes of one event commit or discard together.

mod db;
mod market;
mod unspent;
mod vault;

pub use db::{InMemoryDb, InMemoryTx, LedgerState};
pub use market::InMemoryMarketRepository;
pub use unspent::InMemoryUnspentRepository;
pub use vault::InMemoryVaultRepository;
