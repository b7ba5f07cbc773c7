//! Outbound event channel to the host.
//!
//! This module provides the [`EventSink`] trait used by the bridge to deliver
//! events, and an in-memory channel implementation for in-process hosts and
//! testing.

use crate::{BridgeEvent, ChannelError};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Destination for normalized events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event. Events arrive in emission order.
    async fn emit(&self, event: &BridgeEvent) -> Result<(), ChannelError>;
}

/// Creates a connected sink and receiver pair.
pub fn new_event_channel(buffer: usize) -> (ChannelSink, EventReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (ChannelSink { tx }, EventReceiver { rx })
}

/// Sending half of an in-memory event channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<BridgeEvent>,
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: &BridgeEvent) -> Result<(), ChannelError> {
        self.tx
            .send(event.clone())
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

/// Receiving half of an in-memory event channel.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<BridgeEvent>,
}

impl EventReceiver {
    /// Waits for the next event. Returns None once every sink is dropped.
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        self.rx.recv().await
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<BridgeEvent> {
        self.rx.try_recv().ok()
    }

    /// Takes every queued event.
    pub fn drain(&mut self) -> Vec<BridgeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn close(&mut self) {
        self.rx.close();
    }
}
