use std::default::Default;

use scenesync_shared::SyncConfig;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Used to configure replication of the scene to every user
    pub sync: SyncConfig,
    /// Opaque data handed back to every client in its `LoginReply`
    pub login_reply_payload: Vec<u8>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            login_reply_payload: Vec::new(),
        }
    }
}
