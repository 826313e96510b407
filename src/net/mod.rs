//! Network-facing modules: wire protocol and transport

pub mod protocol;
pub mod transport;

pub use protocol::{ClientMsg, RowChange, RowEvent, ServerMsg};
pub use transport::{NetEvent, NetEventReceiver, NetEventSender, Outbound, TransportError};
