//! Per-player outbound line queue
//!
//! Every message a player should see goes through its [`Outbox`]. Sending
//! never blocks: room locks are held while broadcasting, so a slow or
//! disconnected reader simply misses lines instead of stalling the world.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Receiving half, drained by the connection's writer task
pub type OutboxReceiver = mpsc::Receiver<String>;

/// Sending half, owned by the player entity
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<String>,
}

impl Outbox {
    /// Create a bounded outbox holding at most `capacity` undelivered lines
    pub fn channel(capacity: usize) -> (Self, OutboxReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue one line. Returns false if it was dropped.
    pub fn send(&self, line: impl Into<String>) -> bool {
        match self.tx.try_send(line.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Outbox full, dropping line");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// True once the receiving side is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Pull every line currently queued without waiting
pub fn drain_lines(rx: &mut OutboxReceiver) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}
