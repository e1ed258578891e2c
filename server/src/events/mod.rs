mod events;

pub use events::{DisconnectEvent, ErrorEvent, Event, Events, LoginEvent};
