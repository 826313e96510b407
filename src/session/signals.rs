//! Signals published to UI, camera and logging collaborators

use tokio::sync::broadcast;

use crate::world::types::{EntityId, Identity};

/// Capacity of the signal broadcast channel
pub const SIGNAL_CAPACITY: usize = 64;

pub type SignalSender = broadcast::Sender<SessionSignal>;
pub type SignalReceiver = broadcast::Receiver<SessionSignal>;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// Identity received from the data store
    Connected { identity: Identity },
    /// Initial table contents have been replicated
    SubscriptionApplied,
    /// A new locally owned entity view exists
    Spawned { entity_id: EntityId },
    /// The local player no longer owns any entity
    Eliminated,
    /// Connection ended; `error` is set when it ended abnormally
    Disconnected { error: Option<String> },
}

pub fn channel() -> SignalSender {
    broadcast::channel(SIGNAL_CAPACITY).0
}

/// Publish a signal. Having no subscribers is fine.
pub(crate) fn emit(tx: &SignalSender, signal: SessionSignal) {
    let _ = tx.send(signal);
}
