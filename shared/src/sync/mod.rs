mod component_sync_state;
mod config;
mod diff_mask;
mod entity_sync_state;
mod error;
mod scene_reader;
mod scene_sync_state;
mod scene_writer;
mod sync_manager;

pub use component_sync_state::ComponentSyncState;
pub use config::{SyncConfig, MIN_UPDATE_PERIOD};
pub use diff_mask::DiffMask;
pub use entity_sync_state::{EntitySyncState, UpdateInterval};
pub use error::SyncError;
pub use scene_sync_state::SceneSyncState;
pub use scene_writer::{FlushContext, SceneWriter, Throttle};
pub use sync_manager::{MessageContext, SyncManager};
