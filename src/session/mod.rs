//! Client session: replication bridge, input pipeline and coordinator

pub mod bridge;
pub mod coordinator;
pub mod input;
pub mod signals;

pub use bridge::{ReplicationBridge, SpawnResolution};
pub use coordinator::SessionCoordinator;
pub use input::{InputFrame, InputSampler, InputTransmitter, TransmitState};
pub use signals::{SessionSignal, SignalReceiver};
