use std::{collections::BTreeMap, mem};

use log::{debug, info, warn};

use scenesync_shared::{
    ClientJoined, ClientLeft, ComponentKinds, ConnectionId, EntityId, EntityPrioritizer,
    HostType, InterestManager, Login, LoginReply, MessageId, MessageReceiver, MessageSender,
    Observer, ProtocolMessage, Scene, SyncError, SyncManager, UserId, WireMessage,
};

use crate::{Events, ServerError, ServerConfig, User};

/// A server that owns the authoritative scene and replicates it to every
/// logged in client. Changes made by one client are fanned out to the
/// others.
pub struct Server {
    config: ServerConfig,
    scene: Scene,
    sync_manager: SyncManager,
    transport: Box<dyn MessageSender>,
    users: BTreeMap<ConnectionId, User>,
    next_user_id: UserId,
    events: Events,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig, kinds: ComponentKinds, transport: Box<dyn MessageSender>) -> Self {
        Self::with_plugins(config, kinds, transport, None, None)
    }

    /// Create a new Server that gates and rate limits replication per user
    pub fn with_plugins(
        config: ServerConfig,
        kinds: ComponentKinds,
        transport: Box<dyn MessageSender>,
        interest: Option<InterestManager>,
        prioritizer: Option<Box<dyn EntityPrioritizer>>,
    ) -> Self {
        let sync_manager =
            SyncManager::with_plugins(HostType::Server, config.sync.clone(), interest, prioritizer);
        Self {
            config,
            scene: Scene::new(HostType::Server, kinds),
            sync_manager,
            transport,
            users: BTreeMap::new(),
            next_user_id: 1,
            events: Events::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Changes made through the scene are replicated on the next `update`
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn sync_manager(&self) -> &SyncManager {
        &self.sync_manager
    }

    /// Returns everything that happened since the last call
    pub fn take_events(&mut self) -> Events {
        mem::take(&mut self.events)
    }

    // Users

    pub fn user(&self, connection: ConnectionId) -> Option<&User> {
        self.users.get(&connection)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn logged_in_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|user| user.is_logged_in())
    }

    /// Registers a freshly connected transport connection. The user takes
    /// part in replication once it has logged in.
    pub fn connect(&mut self, connection: ConnectionId) {
        if self.users.contains_key(&connection) {
            warn!("Connection {} is already connected", connection);
            return;
        }
        let user_id = self.next_user_id;
        self.next_user_id = self.next_user_id.wrapping_add(1).max(1);
        self.users.insert(connection, User::new(user_id, connection));
        info!("Connection {} accepted as user {}", connection, user_id);
    }

    /// Drops a connection along with everything replicated to it
    pub fn disconnect(&mut self, connection: ConnectionId) {
        let Some(user) = self.users.remove(&connection) else {
            warn!("Disconnect of unknown connection {}", connection);
            return;
        };
        info!("User {} disconnected", user.id());
        if !user.is_logged_in() {
            return;
        }
        self.sync_manager.remove_connection(connection);

        let left = ClientLeft { user_id: user.id() };
        let others: Vec<ConnectionId> = self.logged_in_users().map(User::connection).collect();
        for other in others {
            if let Err(err) = self.send(other, &left) {
                warn!("Failed to announce departure of user {} to connection {}: {}", user.id(), other, err);
            }
        }
        self.events.push_disconnection(user.id());
    }

    // Messages

    /// Handles one inbound message. Failures are logged and reported as an
    /// `ErrorEvent`, the server keeps running.
    pub fn receive_message(&mut self, connection: ConnectionId, message: WireMessage) {
        if let Err(err) = self.process_message(connection, &message) {
            warn!(
                "Failed to handle message {} from connection {}: {}",
                message.id, connection, err
            );
            self.events.push_error(err);
        }
    }

    /// Handles every message the transport has received so far
    pub fn receive(&mut self, receiver: &mut dyn MessageReceiver) -> Result<(), ServerError> {
        while let Some((connection, message)) = receiver.receive()? {
            self.receive_message(connection, message);
        }
        Ok(())
    }

    fn process_message(
        &mut self,
        connection: ConnectionId,
        message: &WireMessage,
    ) -> Result<(), ServerError> {
        let user = self
            .users
            .get(&connection)
            .ok_or(ServerError::UserNotFound { connection })?;
        let logged_in = user.is_logged_in();
        let id = MessageId::from_u16(message.id);

        if id == Some(MessageId::Login) {
            if logged_in {
                warn!("User {} sent a second login, ignoring", user.id());
                return Ok(());
            }
            let login = Login::from_bytes(&message.payload)?;
            return self.login(connection, login);
        }
        if !logged_in {
            debug!(
                "Ignoring message {} from connection {} before login",
                message.id, connection
            );
            return Ok(());
        }

        match id {
            Some(id) if id.is_scene_message() => {
                self.sync_manager.handle_message(
                    connection,
                    message.id,
                    &message.payload,
                    &mut self.scene,
                    self.transport.as_mut(),
                )?;
                Ok(())
            }
            Some(id) => Err(SyncError::UnexpectedMessage {
                message_id: id.to_u16(),
                connection,
            }
            .into()),
            None => Err(SyncError::UnknownMessageId {
                message_id: message.id,
            }
            .into()),
        }
    }

    fn login(&mut self, connection: ConnectionId, login: Login) -> Result<(), ServerError> {
        let user_id = match self.users.get_mut(&connection) {
            Some(user) => {
                user.log_in();
                user.id()
            }
            None => return Err(ServerError::UserNotFound { connection }),
        };

        self.send(
            connection,
            &LoginReply {
                success: true,
                user_id,
                payload: self.config.login_reply_payload.clone(),
            },
        )?;

        // the new user hears about itself first, then about everyone else
        let joined = ClientJoined { user_id };
        self.send(connection, &joined)?;
        let others: Vec<(ConnectionId, UserId)> = self
            .logged_in_users()
            .filter(|user| user.connection() != connection)
            .map(|user| (user.connection(), user.id()))
            .collect();
        for (other, other_id) in others {
            if let Err(err) = self.send(other, &joined) {
                warn!("Failed to announce user {} to connection {}: {}", user_id, other, err);
            }
            self.send(connection, &ClientJoined { user_id: other_id })?;
        }

        self.sync_manager.add_connection(connection, &self.scene);
        info!("User {} logged in on connection {}", user_id, connection);
        self.events.push_login(user_id, connection, login.payload);
        Ok(())
    }

    fn send<M: ProtocolMessage>(
        &mut self,
        connection: ConnectionId,
        message: &M,
    ) -> Result<(), ServerError> {
        self.transport.send(
            connection,
            WireMessage::reliable(
                M::ID.to_u16(),
                self.config.sync.message_priority,
                message.to_bytes(),
            ),
        )?;
        Ok(())
    }

    // Replication

    /// Must be called regularly. Replicates the scene changes made since the
    /// last flush once every update period.
    pub fn update(&mut self, dt: f32) {
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

    /// Sets the pose the user on `connection` views the scene from. Clients
    /// usually report it themselves.
    pub fn set_observer(&mut self, connection: ConnectionId, observer: Observer) {
        self.sync_manager.set_observer(connection, observer);
    }

    /// Runs an entity action on a single user
    pub fn send_action_to(
        &mut self,
        connection: ConnectionId,
        entity: EntityId,
        name: &str,
        params: Vec<String>,
    ) -> Result<(), ServerError> {
        self.sync_manager
            .send_action_to(connection, entity, name, params, self.transport.as_mut())?;
        Ok(())
    }
}
