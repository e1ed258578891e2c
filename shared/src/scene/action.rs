use bitflags::bitflags;

use super::EntityId;
use crate::types::ConnectionId;

bitflags! {
    /// Where an entity action runs. Flags combine.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ExecutionType: u8 {
        /// On the host that triggered it
        const LOCAL = 1;
        /// On the server
        const SERVER = 2;
        /// On every client
        const PEERS = 4;
    }
}

/// An action that ran on this host. `sender` is the connection the action
/// arrived from, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedAction {
    pub entity: EntityId,
    pub name: String,
    pub params: Vec<String>,
    pub sender: Option<ConnectionId>,
}
