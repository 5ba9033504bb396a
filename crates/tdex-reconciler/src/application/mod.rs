//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod listener;

pub use listener::{BlockchainListener, ListenerDeps};
