//! # Scenesync Client
//! A client that logs in to a scenesync server and keeps a local copy of
//! the server's scene, sending local changes upstream.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use scenesync_shared::{
        AttributeChange, AttributeValue, ComponentKind, ComponentKinds, ExecutionType,
        MessageChannel, MessageReceiver, MessageSender, Observer, Scene, SyncConfig, UserId,
        WireMessage, SERVER_CONNECTION,
    };
}

mod client;
mod error;
mod events;

pub use client::{Client, ClientConfig, ConnectionState};
pub use error::ClientError;
pub use events::{
    ClientJoinedEvent, ClientLeftEvent, ConnectEvent, DisconnectEvent, ErrorEvent, Event, Events,
    LoginFailedEvent,
};
