use thiserror::Error;

use scenesync_shared::{ConnectionId, SerdeErr, SyncError, TransportError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServerError {
    #[error("Scene sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Malformed message: {0}")]
    Serde(#[from] SerdeErr),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("No user on connection {connection}")]
    UserNotFound { connection: ConnectionId },
}
