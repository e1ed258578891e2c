use std::default::Default;

use scenesync_shared::SyncConfig;

/// Contains Config properties which will be used by the Client
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Used to configure replication of local changes to the server
    pub sync: SyncConfig,
    /// Seconds between two `ObserverPosition` reports while an observer is
    /// set. Zero reports on every update.
    pub observer_report_period: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            observer_report_period: 0.1,
        }
    }
}
