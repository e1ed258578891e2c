mod client;
pub use client::{Client, ConnectionState};

mod client_config;
pub use client_config::ClientConfig;
