use std::{mem, vec::IntoIter};

use scenesync_shared::UserId;

use crate::ClientError;

/// Everything that happened to a `Client` since the last
/// `Client::take_events`.
pub struct Events {
    connections: Vec<UserId>,
    login_failures: Vec<Vec<u8>>,
    disconnections: u32,
    joined: Vec<UserId>,
    left: Vec<UserId>,
    errors: Vec<ClientError>,
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
            connections: Vec::new(),
            login_failures: Vec::new(),
            disconnections: 0,
            joined: Vec::new(),
            left: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_connection(&mut self, user_id: UserId) {
        self.connections.push(user_id);
        self.empty = false;
    }

    pub(crate) fn push_login_failure(&mut self, payload: Vec<u8>) {
        self.login_failures.push(payload);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self) {
        self.disconnections += 1;
        self.empty = false;
    }

    pub(crate) fn push_joined(&mut self, user_id: UserId) {
        self.joined.push(user_id);
        self.empty = false;
    }

    pub(crate) fn push_left(&mut self, user_id: UserId) {
        self.left.push(user_id);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ClientError) {
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

// Connect Event, carries the user id assigned by the server
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<UserId>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// Login Failed Event, carries the reply payload
pub struct LoginFailedEvent;
impl Event for LoginFailedEvent {
    type Iter = IntoIter<Vec<u8>>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.login_failures);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.login_failures.is_empty()
    }
}

// Disconnect Event
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<()>;

    fn iter(events: &mut Events) -> Self::Iter {
        let count = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(vec![(); count as usize])
    }

    fn has(events: &Events) -> bool {
        events.disconnections > 0
    }
}

// Client Joined Event
pub struct ClientJoinedEvent;
impl Event for ClientJoinedEvent {
    type Iter = IntoIter<UserId>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.joined);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.joined.is_empty()
    }
}

// Client Left Event
pub struct ClientLeftEvent;
impl Event for ClientLeftEvent {
    type Iter = IntoIter<UserId>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.left);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.left.is_empty()
    }
}

// Error Event
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<ClientError>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
