//! # Scenesync Server
//! A server that replicates an entity-component scene to every logged in
//! client, and fans out the changes any of them make.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use scenesync_shared::{
        AttributeChange, AttributeValue, ComponentKind, ComponentKinds, ConnectionId,
        EntityPrioritizer, ExecutionType, InterestManager, MessageChannel, MessageReceiver,
        MessageSender, Observer, Scene, SyncConfig, UserId, WireMessage,
    };
}

mod error;
mod events;
mod server;
mod user;

pub use error::ServerError;
pub use events::{DisconnectEvent, ErrorEvent, Event, Events, LoginEvent};
pub use server::{Server, ServerConfig};
pub use user::User;
