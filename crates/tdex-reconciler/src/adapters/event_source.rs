//! Channel-backed event source.
//!
//! The address watcher (or a test) pushes notifications through an
//! `EventPublisher`; the listener drains them from the single `EventStream`.

use crate::domain::ReconcilerError;
use crate::events::BlockchainEvent;
use crate::ports::outbound::{EventSource, EventStream};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Producer handle feeding a `ChannelEventSource`.
///
/// Cheap to clone; every clone keeps the stream open until dropped.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    sender: mpsc::UnboundedSender<BlockchainEvent>,
}

impl EventPublisher {
    /// Push one event onto the stream.
    pub fn publish(&self, event: BlockchainEvent) -> Result<(), ReconcilerError> {
        debug!(kind = %event.kind(), "[event-source] publishing event");
        self.sender
            .send(event)
            .map_err(|_| ReconcilerError::SourceClosed)
    }
}

/// Event source backed by an unbounded mpsc channel.
#[derive(Debug)]
pub struct ChannelEventSource {
    sender: Mutex<Option<mpsc::UnboundedSender<BlockchainEvent>>>,
    receiver: Mutex<Option<EventStream>>,
    started: AtomicBool,
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelEventSource {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            started: AtomicBool::new(false),
        }
    }

    /// New producer handle. Fails once the source was stopped.
    pub fn publisher(&self) -> Result<EventPublisher, ReconcilerError> {
        self.sender
            .lock()
            .as_ref()
            .map(|sender| EventPublisher {
                sender: sender.clone(),
            })
            .ok_or(ReconcilerError::SourceClosed)
    }

    /// Drop the source's own sender.
    ///
    /// The stream closes once every outstanding `EventPublisher` is dropped
    /// as well.
    pub fn stop(&self) {
        if self.sender.lock().take().is_some() {
            info!("[event-source] stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl EventSource for ChannelEventSource {
    fn start(&self) -> Result<(), ReconcilerError> {
        if self.sender.lock().is_none() {
            return Err(ReconcilerError::SourceStart(
                "source was stopped".to_string(),
            ));
        }
        if !self.started.swap(true, Ordering::SeqCst) {
            info!("[event-source] started");
        }
        Ok(())
    }

    fn events(&self) -> Result<EventStream, ReconcilerError> {
        self.receiver
            .lock()
            .take()
            .ok_or(ReconcilerError::EventStreamTaken)
    }
}
