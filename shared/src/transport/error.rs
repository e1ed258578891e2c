use thiserror::Error;

use crate::types::ConnectionId;

/// Errors raised by a `MessageSender` or `MessageReceiver`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection is gone, nothing more can be sent to it
    #[error("Connection {connection} is closed")]
    ConnectionClosed { connection: ConnectionId },

    /// The other half of a `MessageChannel` was dropped
    #[error("Message channel is closed")]
    ChannelClosed,
}
