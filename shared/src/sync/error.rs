use thiserror::Error;

use scenesync_serde::SerdeErr;

use crate::{
    scene::{ComponentId, ComponentTypeId, EntityId, SceneError},
    transport::TransportError,
    types::ConnectionId,
};

/// Errors raised while replicating a scene
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Wire data could not be decoded
    #[error("Malformed message: {0}")]
    Serde(#[from] SerdeErr),

    /// A decoded change could not be applied to the scene
    #[error("Scene rejected change: {0}")]
    Scene(#[from] SceneError),

    /// The transport refused a message
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The message id is not part of the scene protocol
    #[error("Unknown message id {message_id}")]
    UnknownMessageId { message_id: u16 },

    /// No sync state exists for the connection
    #[error("No sync state for connection {connection}")]
    ConnectionNotFound { connection: ConnectionId },

    /// A full component names a type that is not registered
    #[error("Unknown component type {type_id} for component {component_id} of entity {entity_id}")]
    UnknownComponentType {
        entity_id: EntityId,
        component_id: ComponentId,
        type_id: ComponentTypeId,
    },

    /// An edit refers to an attribute slot the component does not have
    #[error("Attribute index {index} is out of range for component {component_id} of entity {entity_id}")]
    AttributeIndexOutOfRange {
        entity_id: EntityId,
        component_id: ComponentId,
        index: u8,
    },

    /// The message is only valid in the other direction
    #[error("Message {message_id} is not accepted from connection {connection}")]
    UnexpectedMessage {
        message_id: u16,
        connection: ConnectionId,
    },
}
