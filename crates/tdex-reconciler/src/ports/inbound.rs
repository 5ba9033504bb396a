//! # Inbound Ports
//!
//! API trait defining what the blockchain listener can do.

use super::outbound::EventStream;
use crate::domain::{EventOutcome, ListenerStats};
use crate::events::BlockchainEvent;
use async_trait::async_trait;

/// Blockchain listener API - inbound port.
#[async_trait]
pub trait BlockchainListenerApi: Send + Sync {
    /// Reconcile one event inside its own unit of work.
    ///
    /// The unit of work is committed if the handler completes and discarded
    /// otherwise; it is never left open.
    async fn handle_event(&self, event: BlockchainEvent) -> EventOutcome;

    /// Drain `events` strictly in order until the stream closes.
    ///
    /// Never returns early on a failed event.
    async fn run(&self, events: EventStream) -> ListenerStats;
}
