use std::default::Default;

use nalgebra::Vector3;

/// Shortest allowed flush period, in seconds (100 Hz)
pub const MIN_UPDATE_PERIOD: f32 = 0.01;

/// Contains Config properties which will be used by a `SyncManager`
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Seconds between two flushes of the dirty state. Values below
    /// `MIN_UPDATE_PERIOD` are clamped.
    pub update_period: f32,
    /// When true, entities that are known to a connection are rate limited
    /// by the `EntityPrioritizer`. When false every dirty entity is flushed
    /// on every tick.
    pub prioritized_flush: bool,
    /// Observer-local direction that counts as "forward" for interest
    /// management
    pub forward_axis: Vector3<f32>,
    /// Priority handed to the transport with every scene message
    pub message_priority: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_period: 1.0 / 30.0,
            prioritized_flush: false,
            forward_axis: -Vector3::z(),
            message_priority: 100,
        }
    }
}
