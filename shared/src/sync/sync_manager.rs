use std::collections::{BTreeMap, HashMap};

use log::{info, warn};

use crate::{
    interest::{EntityPrioritizer, InterestManager, Observer},
    messages::{
        CreateAttributes, CreateComponents, CreateComponentsReply, CreateEntity,
        CreateEntityReply, EditAttributes, EntityAction, MessageId, ObserverPosition,
        ProtocolMessage, RemoveAttributes, RemoveComponents, RemoveEntity,
    },
    scene::{AttributeKey, EntityId, ExecutionType, Scene, SceneEvent},
    transport::MessageSender,
    types::{ConnectionId, HostType, SERVER_CONNECTION},
};

use super::{
    config::{SyncConfig, MIN_UPDATE_PERIOD},
    error::SyncError,
    scene_reader::{ReadContext, SceneReader},
    scene_sync_state::SceneSyncState,
    scene_writer::{FlushContext, SceneWriter, Throttle},
};

/// Where the scene changes being handled came from. Changes applied on
/// behalf of a connection are never echoed back to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageContext {
    pub sender: Option<ConnectionId>,
}

impl MessageContext {
    /// Changes made by this host
    pub fn local() -> Self {
        Self { sender: None }
    }

    /// Changes applied from a message of `connection`
    pub fn from_connection(connection: ConnectionId) -> Self {
        Self {
            sender: Some(connection),
        }
    }

    pub fn skips(&self, connection: ConnectionId) -> bool {
        self.sender == Some(connection)
    }
}

/// Queues `entity` for `state`, asking the interest manager first when the
/// connection does not know the entity yet.
fn admit_entity(
    state: &mut SceneSyncState,
    interest: Option<&mut InterestManager>,
    observer: Option<&Observer>,
    scene: &Scene,
    entity: EntityId,
    now: f64,
) -> bool {
    let connection = state.connection();
    match interest {
        Some(interest) => state.mark_entity_dirty_with(entity, |id| {
            interest.check_relevance(connection, observer, scene, id, now)
        }),
        None => state.mark_entity_dirty(entity),
    }
}

/// Replicates one scene over any number of connections. On the server every
/// logged in user has a connection, on a client the only connection is the
/// server.
pub struct SyncManager {
    host_type: HostType,
    config: SyncConfig,
    connections: BTreeMap<ConnectionId, SceneSyncState>,
    observers: HashMap<ConnectionId, Observer>,
    interest: Option<InterestManager>,
    prioritizer: Option<Box<dyn EntityPrioritizer>>,
    update_acc: f32,
    elapsed: f64,
}

impl SyncManager {
    pub fn new(host_type: HostType, config: SyncConfig) -> Self {
        Self::with_plugins(host_type, config, None, None)
    }

    /// `interest` gates which entities reach each connection, `prioritizer`
    /// rate limits them when `SyncConfig::prioritized_flush` is set.
    pub fn with_plugins(
        host_type: HostType,
        mut config: SyncConfig,
        mut interest: Option<InterestManager>,
        prioritizer: Option<Box<dyn EntityPrioritizer>>,
    ) -> Self {
        config.update_period = config.update_period.max(MIN_UPDATE_PERIOD);
        if let Some(interest) = interest.as_mut() {
            interest.set_forward_axis(config.forward_axis);
        }
        Self {
            host_type,
            config,
            connections: BTreeMap::new(),
            observers: HashMap::new(),
            interest,
            prioritizer,
            update_acc: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn update_period(&self) -> f32 {
        self.config.update_period
    }

    /// Sets the seconds between flushes, clamped to `MIN_UPDATE_PERIOD`
    pub fn set_update_period(&mut self, period: f32) {
        self.config.update_period = period.max(MIN_UPDATE_PERIOD);
    }

    /// Seconds accumulated through `update`
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn interest_manager(&self) -> Option<&InterestManager> {
        self.interest.as_ref()
    }

    // Connections

    /// Starts tracking a connection. On the server every replicated entity
    /// is queued so the new user receives the whole scene.
    pub fn add_connection(&mut self, connection: ConnectionId, scene: &Scene) {
        let is_server = self.host_type.is_server();
        let mut state = SceneSyncState::new(connection, is_server);
        if is_server {
            let observer = self.observers.get(&connection);
            for entity in scene.entities().filter(|entity| entity.is_replicated()) {
                admit_entity(
                    &mut state,
                    self.interest.as_mut(),
                    observer,
                    scene,
                    entity.id(),
                    self.elapsed,
                );
            }
        }
        info!("Scene sync started for connection {}", connection);
        if self.connections.insert(connection, state).is_some() {
            warn!("Replaced the sync state of connection {}", connection);
        }
    }

    pub fn remove_connection(&mut self, connection: ConnectionId) -> Option<SceneSyncState> {
        self.observers.remove(&connection);
        if let Some(interest) = self.interest.as_mut() {
            interest.remove_connection(connection);
        }
        let state = self.connections.remove(&connection);
        if state.is_some() {
            info!("Scene sync stopped for connection {}", connection);
        }
        state
    }

    pub fn has_connection(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    pub fn connections(&self) -> impl Iterator<Item = &ConnectionId> {
        self.connections.keys()
    }

    pub fn sync_state(&self, connection: ConnectionId) -> Option<&SceneSyncState> {
        self.connections.get(&connection)
    }

    // Observers

    pub fn set_observer(&mut self, connection: ConnectionId, observer: Observer) {
        self.observers.insert(connection, observer);
    }

    pub fn observer(&self, connection: ConnectionId) -> Option<&Observer> {
        self.observers.get(&connection)
    }

    /// Reports the pose this client views the scene from to the server.
    pub fn send_observer_position(
        &mut self,
        observer: &Observer,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        if !self.connections.contains_key(&SERVER_CONNECTION) {
            return Err(SyncError::ConnectionNotFound {
                connection: SERVER_CONNECTION,
            });
        }
        SceneWriter::send(
            transport,
            SERVER_CONNECTION,
            self.config.message_priority,
            &ObserverPosition {
                position: observer.position,
                orientation: observer.orientation,
            },
        )
    }

    // Actions

    /// Runs an action on one connection only.
    pub fn send_action_to(
        &mut self,
        connection: ConnectionId,
        entity: EntityId,
        name: &str,
        params: Vec<String>,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        if !self.connections.contains_key(&connection) {
            return Err(SyncError::ConnectionNotFound { connection });
        }
        SceneWriter::send(
            transport,
            connection,
            self.config.message_priority,
            &EntityAction {
                entity,
                execution: ExecutionType::LOCAL,
                name: name.to_string(),
                params,
            },
        )
    }

    fn send_triggered_action(
        &mut self,
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
        entity: EntityId,
        name: String,
        params: Vec<String>,
        execution: ExecutionType,
    ) -> Result<(), SyncError> {
        let is_server = self.host_type.is_server();
        let priority = self.config.message_priority;

        // `LOCAL` already ran when the action was triggered
        if is_server
            && execution.contains(ExecutionType::SERVER)
            && !execution.contains(ExecutionType::LOCAL)
        {
            scene.execute_action(entity, &name, params.clone(), None);
        }

        if !is_server && execution.intersects(ExecutionType::SERVER | ExecutionType::PEERS) {
            let action = EntityAction {
                entity,
                execution: execution.difference(ExecutionType::LOCAL),
                name,
                params,
            };
            for connection in self.connections.keys() {
                SceneWriter::send(transport, *connection, priority, &action)?;
            }
            return Ok(());
        }

        if is_server && execution.contains(ExecutionType::PEERS) {
            let action = EntityAction {
                entity,
                execution: ExecutionType::LOCAL,
                name,
                params,
            };
            for connection in self.connections.keys() {
                SceneWriter::send(transport, *connection, priority, &action)?;
            }
        }
        Ok(())
    }

    fn read_entity_action(
        &mut self,
        source: ConnectionId,
        action: EntityAction,
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        if !scene.contains_entity(action.entity) {
            warn!(
                "Entity {} not found for action {} from connection {}",
                action.entity, action.name, source
            );
            return Ok(());
        }
        let is_server = self.host_type.is_server();
        let mut handled = false;

        if action.execution.contains(ExecutionType::LOCAL)
            || (is_server && action.execution.contains(ExecutionType::SERVER))
        {
            scene.execute_action(action.entity, &action.name, action.params.clone(), Some(source));
            handled = true;
        }

        if is_server && action.execution.contains(ExecutionType::PEERS) {
            let forward = EntityAction {
                execution: ExecutionType::LOCAL,
                ..action
            };
            for connection in self.connections.keys().filter(|connection| **connection != source) {
                SceneWriter::send(transport, *connection, self.config.message_priority, &forward)?;
            }
            return Ok(());
        }

        if !handled {
            warn!(
                "Action {} from connection {} went unhandled, execution {:?}",
                action.name, source, action.execution
            );
        }
        Ok(())
    }

    // Scene events

    /// Drains the scene's change events into the sync states of every
    /// connection except the context's sender.
    pub fn handle_scene_events(
        &mut self,
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
        context: MessageContext,
    ) -> Result<(), SyncError> {
        let mut result = Ok(());
        for event in scene.take_events() {
            if let Err(err) = self.handle_scene_event(scene, transport, context, event) {
                warn!("Failed to handle scene event: {}", err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    fn handle_scene_event(
        &mut self,
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
        context: MessageContext,
        event: SceneEvent,
    ) -> Result<(), SyncError> {
        match event {
            SceneEvent::EntityCreated {
                entity,
                change,
                replicated,
            } => {
                if !change.is_replicate() || !replicated {
                    return Ok(());
                }
                if self.host_type.is_server() {
                    self.for_each_connection(context, |state| {
                        if state
                            .entity(entity)
                            .map_or(false, |state| state.is_removed() && !state.is_new())
                        {
                            warn!(
                                "Entity {} is reused on connection {} before its removal was sent",
                                entity,
                                state.connection()
                            );
                        }
                    });
                }
                self.for_each_admitted(scene, entity, context, |_| {});
            }
            SceneEvent::EntityRemoved {
                entity,
                change,
                replicated,
            } => {
                if let Some(interest) = self.interest.as_mut() {
                    interest.remove_entity(entity);
                }
                if !change.is_replicate() || !replicated {
                    return Ok(());
                }
                self.for_each_connection(context, |state| state.mark_entity_removed(entity));
            }
            SceneEvent::ComponentAdded {
                entity,
                component,
                change,
                replicated,
            } => {
                if change.is_replicate() && replicated {
                    self.for_each_admitted(scene, entity, context, |state| {
                        state.mark_component_dirty(entity, component)
                    });
                }
            }
            SceneEvent::ComponentRemoved {
                entity,
                component,
                change,
                replicated,
            } => {
                if change.is_replicate() && replicated {
                    self.for_each_connection(context, |state| {
                        state.mark_component_removed(entity, component)
                    });
                }
            }
            SceneEvent::AttributeChanged {
                entity,
                component,
                index,
                change,
                replicated,
                interpolates,
            } => {
                // a local edit wins over a running blend
                if !self.host_type.is_server()
                    && context.sender.is_none()
                    && interpolates
                    && change.is_replicate()
                {
                    scene.end_attribute_interpolation(AttributeKey::new(entity, component, index));
                }
                if change.is_replicate() && replicated {
                    self.for_each_admitted(scene, entity, context, |state| {
                        state.mark_attribute_dirty(entity, component, index)
                    });
                }
            }
            // attribute slots must match on both ends for bitmask edits, so
            // creation and removal replicate whatever the change scope
            SceneEvent::AttributeAdded {
                entity,
                component,
                index,
                replicated,
                ..
            } => {
                if replicated {
                    self.for_each_admitted(scene, entity, context, |state| {
                        state.mark_attribute_created(entity, component, index)
                    });
                }
            }
            SceneEvent::AttributeRemoved {
                entity,
                component,
                index,
                replicated,
                ..
            } => {
                if replicated {
                    self.for_each_admitted(scene, entity, context, |state| {
                        state.mark_attribute_removed(entity, component, index)
                    });
                }
            }
            SceneEvent::ActionTriggered {
                entity,
                name,
                params,
                execution,
            } => {
                return self.send_triggered_action(scene, transport, entity, name, params, execution);
            }
        }
        Ok(())
    }

    fn for_each_connection(
        &mut self,
        context: MessageContext,
        mut handler: impl FnMut(&mut SceneSyncState),
    ) {
        for (connection, state) in self.connections.iter_mut() {
            if !context.skips(*connection) {
                handler(state);
            }
        }
    }

    /// Runs `handler` for every connection that tracks `entity`, admitting
    /// the entity first where needed.
    fn for_each_admitted(
        &mut self,
        scene: &Scene,
        entity: EntityId,
        context: MessageContext,
        mut handler: impl FnMut(&mut SceneSyncState),
    ) {
        let Self {
            connections,
            observers,
            interest,
            elapsed,
            ..
        } = self;
        for (connection, state) in connections.iter_mut() {
            if context.skips(*connection) {
                continue;
            }
            if admit_entity(
                state,
                interest.as_mut(),
                observers.get(connection),
                scene,
                entity,
                *elapsed,
            ) {
                handler(state);
            }
        }
    }

    // Inbound

    /// Applies one inbound message from `source` and replicates the result
    /// to everyone else.
    pub fn handle_message(
        &mut self,
        source: ConnectionId,
        message_id: u16,
        payload: &[u8],
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        let id = MessageId::from_u16(message_id).ok_or(SyncError::UnknownMessageId { message_id })?;
        if !self.connections.contains_key(&source) {
            return Err(SyncError::ConnectionNotFound { connection: source });
        }
        let result = self.read_message(source, id, payload, scene, transport);
        let drained =
            self.handle_scene_events(scene, transport, MessageContext::from_connection(source));
        result.and(drained)
    }

    fn read_message(
        &mut self,
        source: ConnectionId,
        id: MessageId,
        payload: &[u8],
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        let is_server = self.host_type.is_server();
        match id {
            MessageId::EntityAction => {
                let action = EntityAction::from_bytes(payload)?;
                return self.read_entity_action(source, action, scene, transport);
            }
            MessageId::ObserverPosition if is_server => {
                let message = ObserverPosition::from_bytes(payload)?;
                self.observers
                    .insert(source, Observer::new(message.position, message.orientation));
                return Ok(());
            }
            _ => {}
        }

        let state = self
            .connections
            .get_mut(&source)
            .ok_or(SyncError::ConnectionNotFound { connection: source })?;
        let mut context = ReadContext {
            host_type: self.host_type,
            source,
            state,
            scene,
            transport,
            message_priority: self.config.message_priority,
            now: self.elapsed,
            update_period: self.config.update_period,
        };

        match id {
            MessageId::CreateEntity => {
                SceneReader::read_create_entity(&mut context, CreateEntity::from_bytes(payload)?)
            }
            MessageId::CreateComponents => SceneReader::read_create_components(
                &mut context,
                CreateComponents::from_bytes(payload)?,
            ),
            MessageId::CreateAttributes => SceneReader::read_create_attributes(
                &mut context,
                CreateAttributes::from_bytes(payload)?,
            ),
            MessageId::EditAttributes => SceneReader::read_edit_attributes(
                &mut context,
                EditAttributes::from_bytes(payload)?,
            ),
            MessageId::RemoveAttributes => SceneReader::read_remove_attributes(
                &mut context,
                RemoveAttributes::from_bytes(payload)?,
            ),
            MessageId::RemoveComponents => SceneReader::read_remove_components(
                &mut context,
                RemoveComponents::from_bytes(payload)?,
            ),
            MessageId::RemoveEntity => {
                SceneReader::read_remove_entity(&mut context, RemoveEntity::from_bytes(payload)?)
            }
            MessageId::CreateEntityReply if !is_server => SceneReader::read_create_entity_reply(
                &mut context,
                CreateEntityReply::from_bytes(payload)?,
            ),
            MessageId::CreateComponentsReply if !is_server => {
                SceneReader::read_create_components_reply(
                    &mut context,
                    CreateComponentsReply::from_bytes(payload)?,
                )
            }
            _ => Err(SyncError::UnexpectedMessage {
                message_id: id.to_u16(),
                connection: source,
            }),
        }
    }

    // Tick

    /// Handles pending scene events and, once per update period, sends
    /// every connection what it is missing. Several periods passing in one
    /// call still flush only once.
    pub fn update(
        &mut self,
        dt: f32,
        scene: &mut Scene,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        let result = self.handle_scene_events(scene, transport, MessageContext::local());

        self.elapsed += f64::from(dt);
        self.update_acc += dt;
        let period = self.config.update_period;
        if self.update_acc < period {
            return result;
        }
        self.update_acc %= period;

        self.promote_pending_entities(scene);
        let flushed = self.flush(scene, transport);
        result.and(flushed)
    }

    /// Re-checks entities held back by the interest manager. Each relevant
    /// one is queued exactly once, as new.
    fn promote_pending_entities(&mut self, scene: &Scene) {
        let Some(interest) = self.interest.as_mut() else {
            return;
        };
        let now = self.elapsed;
        for (connection, state) in self.connections.iter_mut() {
            let observer = self.observers.get(connection);
            for id in state.pending_entity_ids() {
                if !scene.contains_entity(id) {
                    state.remove_pending_entity(id);
                    continue;
                }
                if interest.check_relevance(*connection, observer, scene, id, now) {
                    state.mark_pending_entity_dirty(id);
                }
            }
        }
    }

    /// Sends the dirty state of every connection now, regardless of the
    /// update period. A failing connection does not stop the others.
    pub fn flush(
        &mut self,
        scene: &Scene,
        transport: &mut dyn MessageSender,
    ) -> Result<(), SyncError> {
        let now = self.elapsed;
        let Self {
            config,
            connections,
            observers,
            interest,
            prioritizer,
            ..
        } = self;

        let prioritizer = prioritizer.as_deref();

        let mut result = Ok(());
        for (connection, state) in connections.iter_mut() {
            let throttle = match prioritizer {
                Some(prioritizer) if config.prioritized_flush => Some(Throttle {
                    prioritizer,
                    observer: observers.get(connection),
                    base_period: config.update_period,
                }),
                _ => None,
            };
            let context = FlushContext {
                now,
                message_priority: config.message_priority,
                throttle,
            };
            match SceneWriter::process_sync_state(state, scene, transport, &context) {
                Ok(sent) => {
                    if let Some(interest) = interest.as_mut() {
                        for entity in sent {
                            interest.record_update(*connection, entity, now);
                        }
                    }
                }
                Err(err) => {
                    warn!("Failed to send scene changes to connection {}: {}", connection, err);
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
        }
        result
    }
}
