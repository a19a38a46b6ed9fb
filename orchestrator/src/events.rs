//! Attempt progress events for subscribers.

use std::sync::RwLock;
use votechain_types::TxHash;

use crate::{AttemptId, AttemptStatus, TxStage};

/// Progress of a transaction attempt, emitted in state-machine order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptEvent {
    Built {
        id: AttemptId,
        action: String,
    },
    AwaitingSignature {
        id: AttemptId,
        action: String,
    },
    Broadcast {
        id: AttemptId,
        action: String,
        hash: TxHash,
    },
    Confirmed {
        id: AttemptId,
        action: String,
        hash: TxHash,
        block_number: u64,
    },
    Failed {
        id: AttemptId,
        action: String,
        stage: TxStage,
        reason: String,
    },
}

impl AttemptEvent {
    pub fn id(&self) -> AttemptId {
        match self {
            Self::Built { id, .. }
            | Self::AwaitingSignature { id, .. }
            | Self::Broadcast { id, .. }
            | Self::Confirmed { id, .. }
            | Self::Failed { id, .. } => *id,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Built { action, .. }
            | Self::AwaitingSignature { action, .. }
            | Self::Broadcast { action, .. }
            | Self::Confirmed { action, .. }
            | Self::Failed { action, .. } => action,
        }
    }

    /// The attempt status this event announces.
    pub fn status(&self) -> AttemptStatus {
        match self {
            Self::Built { .. } => AttemptStatus::Built,
            Self::AwaitingSignature { .. } => AttemptStatus::AwaitingSignature,
            Self::Broadcast { .. } => AttemptStatus::Broadcast,
            Self::Confirmed { .. } => AttemptStatus::Confirmed,
            Self::Failed { .. } => AttemptStatus::Failed,
        }
    }
}

type Listener = Box<dyn Fn(&AttemptEvent) + Send + Sync>;

/// Synchronous fan-out event bus for attempt events.
///
/// Listeners are invoked inline on the emitting task; keep handlers fast to
/// avoid stalling the attempt.
pub struct AttemptEventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl AttemptEventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Listener) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(listener);
        }
    }

    pub fn emit(&self, event: &AttemptEvent) {
        if let Ok(listeners) = self.listeners.read() {
            for listener in listeners.iter() {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }
}

impl Default for AttemptEventBus {
    fn default() -> Self {
        Self::new()
    }
}
