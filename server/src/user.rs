use scenesync_shared::{ConnectionId, UserId};

/// A client connected to the `Server`. Only logged in users take part in
/// scene replication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    id: UserId,
    connection: ConnectionId,
    logged_in: bool,
}

impl User {
    pub(crate) fn new(id: UserId, connection: ConnectionId) -> Self {
        Self {
            id,
            connection,
            logged_in: false,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub(crate) fn log_in(&mut self) {
        self.logged_in = true;
    }
}
