//! # Scenesync Shared
//! Scene model, replication state, wire messages and interest management
//! shared between scenesync-server & scenesync-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use scenesync_serde::{BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, VarU32};

mod interest;
mod messages;
mod scene;
mod sync;
mod transport;
mod types;

pub use interest::{
    AcceptAll, AllFilters, ComponentSpatialSource, DefaultEntityPrioritizer, DistanceFilter,
    EntityPrioritizer, EntityPriority, FieldOfViewFilter, InterestFilter, InterestManager,
    Observer, RelevanceParams, RelevanceRecord, SpatialSource, DEFAULT_RELEVANCE,
    MIN_DISTANCE_SQUARED, PHYSICS_RELEVANCE,
};
pub use messages::{
    read_edit_blob, read_full_component_data, write_edit_blob, write_full_component,
    ClientJoined, ClientLeft, ComponentIdPair, CreateAttributes, CreateComponents,
    CreateComponentsReply, CreateEntity, CreateEntityReply, EditAttributes, EditEncoding,
    EditedComponent, EntityAction, FullComponent, FullComponentData, Login, LoginReply,
    MessageId, NewAttribute, ObserverPosition, ProtocolMessage, RemoveAttributes,
    RemoveComponents, RemoveEntity,
};
pub use scene::{
    is_local_id, is_unacked_id, unacked_id, wire_id, Attribute, AttributeChange,
    AttributeDescriptor, AttributeKey, AttributeTypeId, AttributeValue, Component, ComponentId,
    ComponentKind, ComponentKinds, ComponentTypeId, Entity, EntityId, ExecutedAction,
    ExecutionType, IdKind, Scene, SceneError, SceneEvent, Transform, UniqueIdGenerator,
    FIRST_LOCAL_ID, FIRST_UNACKED_ID, LAST_REPLICATED_ID, LAST_UNACKED_ID,
};
pub use sync::{
    ComponentSyncState, DiffMask, EntitySyncState, FlushContext, MessageContext,
    SceneSyncState, SceneWriter, SyncConfig, SyncError, SyncManager, Throttle, UpdateInterval,
    MIN_UPDATE_PERIOD,
};
pub use transport::{MessageChannel, MessageReceiver, MessageSender, TransportError, WireMessage};
pub use types::{ConnectionId, HostType, UserId, SERVER_CONNECTION};
