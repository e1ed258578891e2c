use log::{debug, warn};

use crate::{
    interest::{EntityPrioritizer, Observer},
    messages::{
        write_edit_blob, write_full_component, CreateAttributes, CreateComponents, CreateEntity,
        EditAttributes, EditedComponent, NewAttribute, ProtocolMessage, RemoveAttributes,
        RemoveComponents, RemoveEntity,
    },
    scene::{is_unacked_id, Entity, EntityId, Scene},
    transport::{MessageSender, WireMessage},
    types::ConnectionId,
};

use super::{error::SyncError, scene_sync_state::SceneSyncState};

/// Rate limits known entities by their priority for one observer.
pub struct Throttle<'a> {
    pub prioritizer: &'a dyn EntityPrioritizer,
    pub observer: Option<&'a Observer>,
    pub base_period: f32,
}

impl Throttle<'_> {
    fn allows(&self, entity: &Entity, last_sent: Option<f64>, now: f64) -> bool {
        let Some(last_sent) = last_sent else {
            return true;
        };
        let interval = self
            .prioritizer
            .compute_priority(entity, self.observer)
            .update_interval(self.base_period);
        now - last_sent >= f64::from(interval)
    }
}

/// Per flush settings
pub struct FlushContext<'a> {
    pub now: f64,
    pub message_priority: u32,
    pub throttle: Option<Throttle<'a>>,
}

/// Turns the dirty state of one connection into scene messages.
pub struct SceneWriter;

impl SceneWriter {
    pub(crate) fn send<M: ProtocolMessage>(
        transport: &mut dyn MessageSender,
        connection: ConnectionId,
        priority: u32,
        message: &M,
    ) -> Result<(), SyncError> {
        transport.send(
            connection,
            WireMessage::reliable(M::ID.to_u16(), priority, message.to_bytes()),
        )?;
        Ok(())
    }

    /// Drains the dirty queue of `state`, sending what the connection is
    /// missing. Returns the entities that were sent.
    pub fn process_sync_state(
        state: &mut SceneSyncState,
        scene: &Scene,
        transport: &mut dyn MessageSender,
        context: &FlushContext,
    ) -> Result<Vec<EntityId>, SyncError> {
        let connection = state.connection();
        let mut deferred = Vec::new();
        let mut sent = Vec::new();

        let result = Self::drain_queue(
            connection,
            state,
            scene,
            transport,
            context,
            &mut deferred,
            &mut sent,
        );

        for id in deferred {
            state.requeue_entity(id);
        }
        result.map(|_| sent)
    }

    fn drain_queue(
        connection: ConnectionId,
        state: &mut SceneSyncState,
        scene: &Scene,
        transport: &mut dyn MessageSender,
        context: &FlushContext,
        deferred: &mut Vec<EntityId>,
        sent: &mut Vec<EntityId>,
    ) -> Result<(), SyncError> {
        let priority = context.message_priority;

        while let Some(id) = state.pop_dirty_entity() {
            let Some(entity_state) = state.entity(id) else {
                continue;
            };
            let is_new = entity_state.is_new();
            let removed = entity_state.is_removed();
            let last_sent = entity_state.last_sent;

            let Some(entity) = scene.entity(id) else {
                if !is_new && is_unacked_id(id) {
                    // the removal waits for the id the server assigns
                    continue;
                }
                if !removed {
                    warn!(
                        "Entity {} has gone missing from the scene without its removal being signalled",
                        id
                    );
                }
                if removed || !is_new {
                    Self::send(transport, connection, priority, &RemoveEntity { entity: id })?;
                }
                state.remove_entity_state(id);
                continue;
            };

            if entity.is_local() || (!is_new && entity.is_unacked()) {
                continue;
            }

            if removed {
                Self::send(transport, connection, priority, &RemoveEntity { entity: id })?;
                if is_new {
                    // the new generation goes out on the next flush
                    if let Some(entity_state) = state.entity_mut(id) {
                        entity_state.removed = false;
                    }
                    deferred.push(id);
                } else {
                    state.remove_entity_state(id);
                }
                continue;
            }

            if is_new {
                Self::write_create_entity(connection, state, entity, transport, priority)?;
            } else {
                if let Some(throttle) = &context.throttle {
                    if !throttle.allows(entity, last_sent, context.now) {
                        deferred.push(id);
                        continue;
                    }
                }
                Self::write_entity_changes(connection, state, entity, transport, priority)?;
            }

            if let Some(entity_state) = state.entity_mut(id) {
                entity_state.last_sent = Some(context.now);
            }
            sent.push(id);
        }
        Ok(())
    }

    fn write_create_entity(
        connection: ConnectionId,
        state: &mut SceneSyncState,
        entity: &Entity,
        transport: &mut dyn MessageSender,
        priority: u32,
    ) -> Result<(), SyncError> {
        let id = entity.id();
        let mut components = Vec::with_capacity(entity.num_replicated_components());
        for component in entity.components().filter(|component| component.is_replicated()) {
            components.push(write_full_component(component));
            state.mark_component_processed(id, component.id());
        }
        state.mark_entity_processed(id);

        debug!(
            "Creating entity {} with {} components on connection {}",
            id,
            components.len(),
            connection
        );
        Self::send(
            transport,
            connection,
            priority,
            &CreateEntity {
                entity: id,
                temporary: entity.is_temporary(),
                components,
            },
        )
    }

    fn write_entity_changes(
        connection: ConnectionId,
        state: &mut SceneSyncState,
        entity: &Entity,
        transport: &mut dyn MessageSender,
        priority: u32,
    ) -> Result<(), SyncError> {
        let id = entity.id();
        let Some(entity_state) = state.entity_mut(id) else {
            return Ok(());
        };

        let mut remove_components = Vec::new();
        let mut remove_attributes = Vec::new();
        let mut create_components = Vec::new();
        let mut create_attributes = Vec::new();
        let mut edits = Vec::new();

        while let Some(component_id) = entity_state.pop_dirty_component() {
            let Some(component_state) = entity_state.component_mut(component_id) else {
                continue;
            };
            let is_new = component_state.is_new;
            let removed = component_state.removed;

            let Some(component) = entity.component(component_id) else {
                if !is_new && is_unacked_id(component_id) {
                    continue;
                }
                if !removed {
                    warn!(
                        "Component {} of entity {} has gone missing without its removal being signalled",
                        component_id, id
                    );
                }
                if removed || !is_new {
                    remove_components.push(component_id);
                }
                entity_state.remove_component_state(component_id);
                continue;
            };

            if component.is_local() || (!is_new && component.is_unacked()) {
                continue;
            }

            if removed {
                remove_components.push(component_id);
                if !is_new {
                    entity_state.remove_component_state(component_id);
                    continue;
                }
                // removal goes first in the flush, the new generation follows
                component_state.removed = false;
            }

            if is_new {
                create_components.push(write_full_component(component));
                component_state.dirty_processed();
                continue;
            }

            let created_and_removed = std::mem::take(&mut component_state.new_and_removed_attributes);
            for (index, created) in created_and_removed {
                component_state.dirty_attributes.set_bit(index, false);
                if !created {
                    remove_attributes.push((component_id, index));
                    continue;
                }
                match component.attribute(index) {
                    Some(attribute) if attribute.is_dynamic() => {
                        create_attributes.push(NewAttribute {
                            component: component_id,
                            index,
                            name: attribute.name().to_string(),
                            value: attribute.value().clone(),
                        });
                    }
                    Some(_) => warn!(
                        "Creation of static attribute {} was queued for component {} of entity {}, discarding",
                        index, component_id, id
                    ),
                    None => warn!(
                        "Creation of missing attribute {} was queued for component {} of entity {}, discarding",
                        index, component_id, id
                    ),
                }
            }

            let mut changed = Vec::with_capacity(component_state.dirty_attributes.count());
            for index in component_state.dirty_attributes.iter() {
                if component.attribute(index).is_some() {
                    changed.push(index);
                } else {
                    warn!(
                        "Change of missing attribute {} was queued for component {} of entity {}, discarding",
                        index, component_id, id
                    );
                }
            }
            if !changed.is_empty() {
                edits.push(EditedComponent {
                    component: component_id,
                    data: write_edit_blob(component, &changed),
                });
            }
            component_state.dirty_processed();
        }

        if !remove_components.is_empty() {
            Self::send(
                transport,
                connection,
                priority,
                &RemoveComponents {
                    entity: id,
                    components: remove_components,
                },
            )?;
        }
        if !remove_attributes.is_empty() {
            Self::send(
                transport,
                connection,
                priority,
                &RemoveAttributes {
                    entity: id,
                    attributes: remove_attributes,
                },
            )?;
        }
        if !create_components.is_empty() {
            Self::send(
                transport,
                connection,
                priority,
                &CreateComponents {
                    entity: id,
                    components: create_components,
                },
            )?;
        }
        if !create_attributes.is_empty() {
            Self::send(
                transport,
                connection,
                priority,
                &CreateAttributes {
                    entity: id,
                    attributes: create_attributes,
                },
            )?;
        }
        if !edits.is_empty() {
            Self::send(
                transport,
                connection,
                priority,
                &EditAttributes {
                    entity: id,
                    components: edits,
                },
            )?;
        }
        Ok(())
    }
}
