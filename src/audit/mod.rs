//! Audit hand-off - sort outcomes for external consumers
//!
//! The sorter side never waits: events go through a bounded channel and are
//! dropped (and counted) when the consumer falls behind.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::sorting::{MoveRecord, SortResult};

/// One completed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    /// What ran, e.g. "sort" or "sort_input"
    pub operation: String,
    pub preview: bool,
    pub result: SortResult,
    pub moves: Vec<MoveRecord>,
}

impl AuditEvent {
    pub fn new(operation: &str, preview: bool, result: SortResult, moves: Vec<MoveRecord>) -> Self {
        Self {
            operation: operation.to_string(),
            preview,
            result,
            moves,
        }
    }

    /// Total items across the recorded moves
    pub fn moved(&self) -> u32 {
        self.moves.iter().map(|m| m.count).sum()
    }
}

/// Publishing half of the audit channel
#[derive(Debug, Clone)]
pub struct AuditQueue {
    sender: mpsc::Sender<AuditEvent>,
    dropped: Arc<AtomicU64>,
}

/// Consuming half of the audit channel
#[derive(Debug)]
pub struct AuditReceiver {
    receiver: mpsc::Receiver<AuditEvent>,
}

impl AuditQueue {
    /// A queue holding at most `capacity` pending events
    pub fn bounded(capacity: usize) -> (AuditQueue, AuditReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            AuditQueue {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            AuditReceiver { receiver },
        )
    }

    /// Hand an event to the consumer; returns false when it was dropped
    pub fn publish(&self, event: AuditEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                let reason = match err {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "consumer gone",
                };
                tracing::debug!("Dropped audit event ({}), {} dropped so far", reason, total);
                false
            }
        }
    }

    /// Events dropped since the queue was created
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AuditReceiver {
    /// Next event; `None` once every queue handle is gone and the buffer is drained
    pub async fn recv(&mut self) -> Option<AuditEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<AuditEvent> {
        self.receiver.try_recv().ok()
    }
}
