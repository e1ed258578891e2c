use log::debug;

use scenesync_client::{Client, ClientConfig, ClientError};
use scenesync_server::{Server, ServerConfig};
use scenesync_shared::{ComponentKinds, ConnectionId, MessageSender, SyncConfig};

use crate::helpers::{component_kinds, RecordingTransport};

/// Seconds advanced by one `TestNetwork::tick`. Also the update period of
/// every host, so each tick flushes.
pub const TICK: f32 = 0.05;

/// Upper bound on delivery rounds before `deliver` gives up
const MAX_DELIVERY_ROUNDS: usize = 64;

struct TestClient {
    client: Client,
    outbox: RecordingTransport,
    connected: bool,
}

/// A server and any number of clients wired together in memory. Client `i`
/// talks to the server over connection `i + 1`.
pub struct TestNetwork {
    server: Server,
    server_outbox: RecordingTransport,
    clients: Vec<TestClient>,
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::with_server(|kinds, transport| Server::new(server_config(), kinds, transport))
    }

    /// Builds the server with `build`, for tests that need plugins or a
    /// custom config
    pub fn with_server(
        build: impl FnOnce(ComponentKinds, Box<dyn MessageSender>) -> Server,
    ) -> Self {
        let server_outbox = RecordingTransport::new();
        let server = build(component_kinds(), server_outbox.boxed());
        Self {
            server,
            server_outbox,
            clients: Vec::new(),
        }
    }

    pub fn connection(index: usize) -> ConnectionId {
        index as ConnectionId + 1
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut Server {
        &mut self.server
    }

    pub fn client(&self, index: usize) -> &Client {
        &self.clients[index].client
    }

    pub fn client_mut(&mut self, index: usize) -> &mut Client {
        &mut self.clients[index].client
    }

    pub fn server_outbox(&self) -> &RecordingTransport {
        &self.server_outbox
    }

    pub fn client_outbox(&self, index: usize) -> &RecordingTransport {
        &self.clients[index].outbox
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Adds a client that is connected at transport level but has not
    /// logged in yet
    pub fn add_silent_client(&mut self) -> usize {
        let index = self.clients.len();
        let outbox = RecordingTransport::new();
        let client = Client::new(client_config(), component_kinds(), outbox.boxed());
        self.server.connect(Self::connection(index));
        self.clients.push(TestClient {
            client,
            outbox,
            connected: true,
        });
        index
    }

    /// Adds a client, logs it in and lets the initial scene arrive
    pub fn add_client(&mut self) -> Result<usize, ClientError> {
        let index = self.add_silent_client();
        self.clients[index].client.connect(Vec::new())?;
        self.settle();
        Ok(index)
    }

    /// Drops the transport connection of client `index` on both ends.
    /// Messages still in flight are lost.
    pub fn disconnect_client(&mut self, index: usize) {
        let connection = Self::connection(index);
        self.server.disconnect(connection);
        self.server_outbox.take_for(connection);
        self.server_outbox.close(connection);

        let test_client = &mut self.clients[index];
        test_client.client.disconnect();
        test_client.outbox.take();
        test_client.connected = false;
    }

    /// Opens a new transport connection for client `index` and logs in again
    pub fn reconnect_client(&mut self, index: usize) -> Result<(), ClientError> {
        let connection = Self::connection(index);
        self.server_outbox.reopen(connection);
        self.server.connect(connection);
        self.clients[index].connected = true;
        self.clients[index].client.connect(Vec::new())?;
        self.settle();
        Ok(())
    }

    /// Hands every queued message to its receiver until no host has anything
    /// left to say. Returns the number of messages delivered.
    pub fn deliver(&mut self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_DELIVERY_ROUNDS {
            let mut round = 0;

            for (connection, message) in self.server_outbox.take() {
                let Some(index) = (connection as usize).checked_sub(1) else {
                    continue;
                };
                match self.clients.get_mut(index) {
                    Some(test_client) if test_client.connected => {
                        test_client.client.receive_message(message);
                        round += 1;
                    }
                    _ => debug!("Dropping message {} to connection {}", message.id, connection),
                }
            }

            for index in 0..self.clients.len() {
                let messages = self.clients[index].outbox.take();
                if !self.clients[index].connected {
                    continue;
                }
                for (_, message) in messages {
                    self.server.receive_message(Self::connection(index), message);
                    round += 1;
                }
            }

            if round == 0 {
                break;
            }
            delivered += round;
        }
        delivered
    }

    /// Advances every host by one `TICK` and delivers the result
    pub fn tick(&mut self) -> usize {
        self.server.update(TICK);
        for test_client in self.clients.iter_mut() {
            test_client.client.update(TICK);
        }
        self.deliver()
    }

    /// Ticks until changes have made a full round trip between clients
    pub fn settle(&mut self) {
        self.deliver();
        for _ in 0..4 {
            self.tick();
        }
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        sync: SyncConfig {
            update_period: TICK,
            ..SyncConfig::default()
        },
        ..ServerConfig::default()
    }
}

pub fn client_config() -> ClientConfig {
    ClientConfig {
        sync: SyncConfig {
            update_period: TICK,
            ..SyncConfig::default()
        },
        ..ClientConfig::default()
    }
}
