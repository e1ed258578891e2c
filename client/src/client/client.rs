use std::{collections::BTreeSet, mem};

use log::{debug, info, warn};

use scenesync_shared::{
    AttributeChange, ClientJoined, ClientLeft, ComponentKinds, HostType, Login, LoginReply, MessageId,
    MessageReceiver, MessageSender, Observer, ProtocolMessage, Scene, SyncError, SyncManager,
    UserId, WireMessage, SERVER_CONNECTION,
};

use crate::{ClientConfig, ClientError, Events};

/// Where the client stands with the server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// `Login` sent, waiting for the reply
    LoggingIn,
    LoggedIn,
    LoginFailed,
}

/// A client that mirrors the server's scene. Local changes to replicated
/// objects are sent upstream and acknowledged with server assigned ids.
pub struct Client {
    config: ClientConfig,
    scene: Scene,
    sync_manager: SyncManager,
    transport: Box<dyn MessageSender>,
    state: ConnectionState,
    user_id: Option<UserId>,
    has_logged_in: bool,
    joined_users: BTreeSet<UserId>,
    observer: Option<Observer>,
    observer_acc: f32,
    events: Events,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig, kinds: ComponentKinds, transport: Box<dyn MessageSender>) -> Self {
        let sync_manager = SyncManager::new(HostType::Client, config.sync.clone());
        Self {
            config,
            scene: Scene::new(HostType::Client, kinds),
            sync_manager,
            transport,
            state: ConnectionState::Disconnected,
            user_id: None,
            has_logged_in: false,
            joined_users: BTreeSet::new(),
            observer: None,
            observer_acc: 0.0,
            events: Events::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Changes to replicated objects are sent upstream on the next `update`
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn sync_manager(&self) -> &SyncManager {
        &self.sync_manager
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == ConnectionState::LoggedIn
    }

    /// The id the server assigned on the last successful login
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Other users currently logged in to the server
    pub fn joined_users(&self) -> impl Iterator<Item = &UserId> {
        self.joined_users.iter()
    }

    /// Returns everything that happened since the last call
    pub fn take_events(&mut self) -> Events {
        mem::take(&mut self.events)
    }

    // Connection

    /// Sends the login request over a freshly connected transport.
    pub fn connect(&mut self, login_payload: Vec<u8>) -> Result<(), ClientError> {
        if matches!(
            self.state,
            ConnectionState::LoggingIn | ConnectionState::LoggedIn
        ) {
            return Err(ClientError::AlreadyConnected);
        }
        self.send(&Login {
            payload: login_payload,
        })?;
        self.state = ConnectionState::LoggingIn;
        info!("Logging in to server");
        Ok(())
    }

    /// Forgets the server. The scene is kept until the next successful
    /// login replaces it.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        let was_logged_in = self.is_logged_in();
        self.state = ConnectionState::Disconnected;
        self.sync_manager.remove_connection(SERVER_CONNECTION);
        self.joined_users.clear();
        self.observer_acc = 0.0;
        if was_logged_in {
            info!("Disconnected from server");
            self.events.push_disconnection();
        }
    }

    // Messages

    /// Handles one message from the server. Failures are logged and reported
    /// as an `ErrorEvent`, the client keeps running.
    pub fn receive_message(&mut self, message: WireMessage) {
        if let Err(err) = self.process_message(&message) {
            warn!("Failed to handle message {} from server: {}", message.id, err);
            self.events.push_error(err);
        }
    }

    /// Handles every message the transport has received so far
    pub fn receive(&mut self, receiver: &mut dyn MessageReceiver) -> Result<(), ClientError> {
        while let Some((connection, message)) = receiver.receive()? {
            if connection != SERVER_CONNECTION {
                warn!("Ignoring message {} from connection {}", message.id, connection);
                continue;
            }
            self.receive_message(message);
        }
        Ok(())
    }

    fn process_message(&mut self, message: &WireMessage) -> Result<(), ClientError> {
        let Some(id) = MessageId::from_u16(message.id) else {
            return Err(SyncError::UnknownMessageId {
                message_id: message.id,
            }
            .into());
        };

        match id {
            MessageId::LoginReply => {
                let reply = LoginReply::from_bytes(&message.payload)?;
                self.read_login_reply(reply);
                Ok(())
            }
            MessageId::Login => Err(SyncError::UnexpectedMessage {
                message_id: id.to_u16(),
                connection: SERVER_CONNECTION,
            }
            .into()),
            _ if !self.is_logged_in() => {
                debug!("Ignoring message {} before login", message.id);
                Ok(())
            }
            MessageId::ClientJoined => {
                let joined = ClientJoined::from_bytes(&message.payload)?;
                if Some(joined.user_id) != self.user_id && self.joined_users.insert(joined.user_id) {
                    info!("User {} joined", joined.user_id);
                    self.events.push_joined(joined.user_id);
                }
                Ok(())
            }
            MessageId::ClientLeft => {
                let left = ClientLeft::from_bytes(&message.payload)?;
                if self.joined_users.remove(&left.user_id) {
                    info!("User {} left", left.user_id);
                    self.events.push_left(left.user_id);
                }
                Ok(())
            }
            _ => {
                self.sync_manager.handle_message(
                    SERVER_CONNECTION,
                    message.id,
                    &message.payload,
                    &mut self.scene,
                    self.transport.as_mut(),
                )?;
                Ok(())
            }
        }
    }

    fn read_login_reply(&mut self, reply: LoginReply) {
        if self.state != ConnectionState::LoggingIn {
            warn!("Unexpected login reply in state {:?}, ignoring", self.state);
            return;
        }
        if !reply.success {
            warn!("Login refused by server");
            self.state = ConnectionState::LoginFailed;
            self.events.push_login_failure(reply.payload);
            return;
        }

        if self.has_logged_in {
            // the server resends its whole scene after a reconnect
            info!("Reconnected, clearing the scene");
            self.scene.clear(AttributeChange::Disconnected);
        }
        self.state = ConnectionState::LoggedIn;
        self.has_logged_in = true;
        self.user_id = Some(reply.user_id);
        self.joined_users.clear();
        self.sync_manager.add_connection(SERVER_CONNECTION, &self.scene);
        info!("Logged in as user {}", reply.user_id);
        self.events.push_connection(reply.user_id);
    }

    fn send<M: ProtocolMessage>(&mut self, message: &M) -> Result<(), ClientError> {
        self.transport.send(
            SERVER_CONNECTION,
            WireMessage::reliable(
                M::ID.to_u16(),
                self.config.sync.message_priority,
                message.to_bytes(),
            ),
        )?;
        Ok(())
    }

    // Replication

    /// Must be called regularly. Advances interpolations and, while logged
    /// in, sends local changes and observer reports upstream. Changes made
    /// while logged out are dropped.
    pub fn update(&mut self, dt: f32) {
        self.scene.update_interpolations(dt);
        if !self.is_logged_in() {
            let dropped = self.scene.take_events();
            if !dropped.is_empty() {
                debug!("Not logged in, dropping {} scene changes", dropped.len());
            }
            return;
        }

        if let Some(observer) = self.observer {
            self.observer_acc += dt;
            if self.observer_acc >= self.config.observer_report_period {
                self.observer_acc = 0.0;
                if let Err(err) = self
                    .sync_manager
                    .send_observer_position(&observer, self.transport.as_mut())
                {
                    warn!("Failed to report observer position: {}", err);
                    self.events.push_error(err.into());
                }
            }
        }

        if let Err(err) = self
            .sync_manager
            .update(dt, &mut self.scene, self.transport.as_mut())
        {
            warn!("Scene replication failed: {}", err);
            self.events.push_error(err.into());
        }
    }

    /// Seconds between two flushes, clamped to at least 10 ms
    pub fn set_update_period(&mut self, period: f32) {
        self.sync_manager.set_update_period(period);
    }

    /// Sets the pose this client views the scene from. It is reported to the
    /// server for interest management.
    pub fn set_observer(&mut self, observer: Observer) {
        self.observer = Some(observer);
        self.observer_acc = self.config.observer_report_period;
    }

    pub fn observer(&self) -> Option<&Observer> {
        self.observer.as_ref()
    }
}
