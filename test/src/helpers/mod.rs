pub mod recording_transport;
pub mod test_network;
pub mod test_protocol;

pub use recording_transport::{message_ids, RecordingTransport};
pub use test_network::{client_config, server_config, TestNetwork, TICK};
pub use test_protocol::{component_kinds, DYNAMIC, NAME, PLACEABLE, STATS};
