/// Identifies one remote peer. On the client the server is always
/// `SERVER_CONNECTION`.
pub type ConnectionId = u32;
pub type UserId = u32;

pub const SERVER_CONNECTION: ConnectionId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn is_server(self) -> bool {
        self == HostType::Server
    }
}
