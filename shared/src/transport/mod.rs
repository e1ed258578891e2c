mod channel;
mod error;

pub use channel::MessageChannel;
pub use error::TransportError;

use crate::types::ConnectionId;

/// One message as handed to, or received from, the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireMessage {
    pub id: u16,
    pub reliable: bool,
    pub ordered: bool,
    pub priority: u32,
    pub payload: Box<[u8]>,
}

impl WireMessage {
    /// A reliable, ordered message
    pub fn reliable(id: u16, priority: u32, payload: Box<[u8]>) -> Self {
        Self {
            id,
            reliable: true,
            ordered: true,
            priority,
            payload,
        }
    }
}

/// Outbound half of the transport. Delivery to one connection is expected
/// to keep the order of reliable, ordered messages.
pub trait MessageSender {
    fn send(&mut self, connection: ConnectionId, message: WireMessage)
        -> Result<(), TransportError>;
}

/// Inbound half of the transport, polled from the tick thread
pub trait MessageReceiver {
    fn receive(&mut self) -> Result<Option<(ConnectionId, WireMessage)>, TransportError>;
}
