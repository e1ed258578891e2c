use thiserror::Error;

use scenesync_shared::{SerdeErr, SyncError, TransportError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Scene sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Malformed message: {0}")]
    Serde(#[from] SerdeErr),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Client is already connected")]
    AlreadyConnected,
}
