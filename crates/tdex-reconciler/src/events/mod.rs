//! # Events
//!
//! Notifications produced by the address watcher and consumed by the
//! blockchain listener.

pub mod incoming;

pub use incoming::{BlockchainEvent, EventKind, UtxoNotice};
