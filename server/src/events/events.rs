use std::{mem, vec::IntoIter};

use scenesync_shared::{ConnectionId, UserId};

use crate::ServerError;

/// Everything that happened to the users of a `Server` since the last
/// `Server::take_events`.
pub struct Events {
    logins: Vec<(UserId, ConnectionId, Vec<u8>)>,
    disconnections: Vec<UserId>,
    errors: Vec<ServerError>,
    empty: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            logins: Vec::new(),
            disconnections: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_login(&mut self, user_id: UserId, connection: ConnectionId, payload: Vec<u8>) {
        self.logins.push((user_id, connection, payload));
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, user_id: UserId) {
        self.disconnections.push(user_id);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ServerError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// Login Event
pub struct LoginEvent;
impl Event for LoginEvent {
    type Iter = IntoIter<(UserId, ConnectionId, Vec<u8>)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.logins);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.logins.is_empty()
    }
}

// Disconnect Event
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<UserId>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// Error Event
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<ServerError>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
