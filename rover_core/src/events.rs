//! Connection notifications routed from the input hub to the orchestrator.
//!
//! The orchestrator hands a [`ChannelListener`] to the hub at construction and
//! drains the receiving end at the start of every tick, so link changes are
//! applied inside the cycle rather than from a callback context.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rover_traits::{ConnectionEvent, ConnectionListener};

/// `ConnectionListener` that forwards every event into a channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: Sender<ConnectionEvent>,
}

impl ConnectionListener for ChannelListener {
    fn notify(&self, event: ConnectionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(?event, "connection event dropped; orchestrator gone");
        }
    }
}

/// Create a listener and the receiver it feeds.
pub fn connection_channel() -> (ChannelListener, Receiver<ConnectionEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelListener { tx }, rx)
}

/// Collect every event queued so far without blocking.
pub fn drain(rx: &Receiver<ConnectionEvent>) -> Vec<ConnectionEvent> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => out.push(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    out
}
