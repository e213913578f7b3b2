//! Event bus between the replay loop and the JSON-lines printer.
//!
//! Every event the protocol records is stamped with a sequence number and
//! the step time, then broadcast. Subscribers that fall behind see a lag
//! error rather than blocking the replay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use veth_types::{Event, Timestamp};

/// A protocol event with its position in the replay.
#[derive(Debug, Clone, Serialize)]
pub struct SequencedEvent {
    /// 1-based emission order.
    pub seq: u64,
    /// Time of the step that produced the event.
    pub at: Timestamp,
    /// Index of the producing step in the scenario.
    pub step: usize,
    #[serde(flatten)]
    pub event: Event,
}

impl SequencedEvent {
    /// One JSON line. `serde_json::Value` cannot hold `u128`, so this goes
    /// straight to text.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Event bus for broadcasting protocol events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SequencedEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamp and broadcast `event`.
    pub fn emit(&self, step: usize, at: Timestamp, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(seq, step, event = event.name(), "event emitted");
        // No subscribers is fine
        let _ = self.sender.send(SequencedEvent {
            seq,
            at,
            step,
            event,
        });
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<SequencedEvent> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}
