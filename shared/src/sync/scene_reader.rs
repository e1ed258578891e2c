use log::{debug, warn};

use crate::{
    messages::{
        read_edit_blob, read_full_component_data, ComponentIdPair, CreateAttributes, CreateComponents,
        CreateComponentsReply, CreateEntity, CreateEntityReply, EditAttributes, FullComponent,
        FullComponentData, RemoveAttributes, RemoveComponents, RemoveEntity,
    },
    scene::{
        unacked_id, AttributeChange, AttributeKey, ComponentId, ComponentTypeId, EntityId, Scene,
        SceneError,
    },
    transport::MessageSender,
    types::{ConnectionId, HostType},
};

use super::{error::SyncError, scene_sync_state::SceneSyncState, scene_writer::SceneWriter};

/// Grace factor on the measured update interval, so interpolations still
/// run when packets arrive with some jitter
const INTERPOLATION_FUDGE: f32 = 1.25;

/// Everything an inbound scene message is applied with
pub(crate) struct ReadContext<'a> {
    pub host_type: HostType,
    pub source: ConnectionId,
    pub state: &'a mut SceneSyncState,
    pub scene: &'a mut Scene,
    pub transport: &'a mut dyn MessageSender,
    pub message_priority: u32,
    pub now: f64,
    pub update_period: f32,
}

impl ReadContext<'_> {
    fn is_server(&self) -> bool {
        self.host_type.is_server()
    }

    /// Inbound changes fan out to the other clients on the server and stay
    /// local on a client.
    fn change(&self) -> AttributeChange {
        if self.is_server() {
            AttributeChange::Replicate
        } else {
            AttributeChange::LocalOnly
        }
    }

    /// Makes sure the source is believed to hold `entity`, without touching
    /// changes still queued for it.
    fn mark_known(&mut self, entity: EntityId) {
        if self.is_server() {
            self.state.remove_pending_entity(entity);
        }
        if self.state.entity(entity).is_none() {
            self.state.mark_entity_processed(entity);
        }
    }

    /// Whether `entity` exists after the call. A client trusts the server
    /// and creates an empty placeholder for an entity it has not seen.
    fn ensure_entity(&mut self, entity: EntityId, message: &str) -> bool {
        if self.scene.contains_entity(entity) {
            return true;
        }
        if self.is_server() {
            warn!(
                "Entity {} not found for {} from connection {}",
                entity, message, self.source
            );
            return false;
        }
        warn!(
            "Entity {} not found for {}, creating a placeholder",
            entity, message
        );
        match self.scene.create_entity(entity, AttributeChange::LocalOnly) {
            Ok(_) => {
                self.mark_known(entity);
                true
            }
            Err(err) => {
                warn!("Could not create placeholder entity {}: {}", entity, err);
                false
            }
        }
    }
}

/// A full component whose blob decoded against a registered kind
struct DecodedComponent {
    id: ComponentId,
    type_id: ComponentTypeId,
    name: String,
    data: FullComponentData,
}

/// Applies inbound scene messages to the local scene and mirrors them into
/// the sender's sync state.
pub(crate) struct SceneReader;

impl SceneReader {
    /// Decodes every blob before anything touches the scene, so a malformed
    /// message leaves no partially created entity behind. Unknown component
    /// types are skipped.
    fn decode_components(
        scene: &Scene,
        entity: EntityId,
        components: Vec<FullComponent>,
    ) -> Result<Vec<DecodedComponent>, SyncError> {
        let mut decoded = Vec::with_capacity(components.len());
        for component in components {
            let Some(kind) = scene.component_kinds().kind(component.type_id) else {
                warn!(
                    "{}, skipping component",
                    SyncError::UnknownComponentType {
                        entity_id: entity,
                        component_id: component.id,
                        type_id: component.type_id,
                    }
                );
                continue;
            };
            let data = read_full_component_data(kind, component.id, &component.data)?;
            decoded.push(DecodedComponent {
                id: component.id,
                type_id: component.type_id,
                name: component.name,
                data,
            });
        }
        Ok(decoded)
    }

    /// Creates one decoded component under `id`, 0 allocating a fresh one.
    /// Attribute values are written silently, the creation event covers
    /// them.
    fn apply_component(
        scene: &mut Scene,
        entity: EntityId,
        id: ComponentId,
        component: DecodedComponent,
        change: AttributeChange,
    ) -> Result<ComponentId, SceneError> {
        let id = scene.create_component(entity, id, component.type_id, &component.name, change)?;
        for (index, value) in component.data.static_values.into_iter().enumerate() {
            let index = u8::try_from(index).unwrap_or(u8::MAX);
            scene.set_attribute(
                AttributeKey::new(entity, id, index),
                value,
                AttributeChange::Disconnected,
            )?;
        }
        for attribute in component.data.dynamic_attributes {
            let key = AttributeKey::new(entity, id, attribute.index);
            if let Err(err) = scene.create_attribute(
                key,
                &attribute.name,
                attribute.value,
                AttributeChange::Disconnected,
            ) {
                warn!(
                    "Failed to create dynamic attribute, skipping the rest of component {}: {}",
                    id, err
                );
                break;
            }
        }
        Ok(id)
    }

    pub fn read_create_entity(
        context: &mut ReadContext,
        message: CreateEntity,
    ) -> Result<(), SyncError> {
        let sender_entity = message.entity;
        let decoded = Self::decode_components(context.scene, sender_entity, message.components)?;
        let change = context.change();

        let entity = if context.is_server() {
            // the server never keeps the id a client picked
            context.state.remove_pending_entity(sender_entity);
            context.scene.create_entity(0, change)?
        } else {
            if context.scene.contains_entity(sender_entity) {
                warn!(
                    "Received creation of entity {} that already exists, removing the old entity",
                    sender_entity
                );
                context
                    .scene
                    .remove_entity(sender_entity, AttributeChange::LocalOnly)?;
                context.state.remove_entity_state(sender_entity);
            }
            context.scene.create_entity(sender_entity, change)?
        };
        context.scene.set_temporary(entity, message.temporary)?;
        context.state.mark_entity_processed(entity);

        let mut rewrites = Vec::new();
        for component in decoded {
            let sender_id = component.id;
            let id = if context.is_server() { 0 } else { sender_id };
            match Self::apply_component(context.scene, entity, id, component, change) {
                Ok(id) => {
                    context.state.mark_component_processed(entity, id);
                    rewrites.push(ComponentIdPair {
                        sender_id,
                        new_id: id,
                    });
                }
                Err(err) => warn!(
                    "Failed to create component {} of entity {}, skipping: {}",
                    sender_id, entity, err
                ),
            }
        }

        debug!(
            "Created entity {} from connection {} with {} components",
            entity,
            context.source,
            rewrites.len()
        );

        if context.is_server() {
            SceneWriter::send(
                context.transport,
                context.source,
                context.message_priority,
                &CreateEntityReply {
                    sender_entity,
                    new_entity: entity,
                    components: rewrites,
                },
            )?;
        }
        Ok(())
    }

    pub fn read_create_components(
        context: &mut ReadContext,
        message: CreateComponents,
    ) -> Result<(), SyncError> {
        let entity = message.entity;
        if !context.ensure_entity(entity, "CreateComponents") {
            return Ok(());
        }
        let decoded = Self::decode_components(context.scene, entity, message.components)?;
        let change = context.change();
        context.mark_known(entity);

        let mut rewrites = Vec::new();
        for component in decoded {
            let sender_id = component.id;
            let id = if context.is_server() {
                0
            } else {
                if context.scene.component(entity, sender_id).is_some() {
                    warn!(
                        "Received creation of component {} that already exists in entity {}, removing the old component",
                        sender_id, entity
                    );
                    context
                        .scene
                        .remove_component(entity, sender_id, AttributeChange::LocalOnly)?;
                    context.state.remove_component_state(entity, sender_id);
                }
                sender_id
            };
            match Self::apply_component(context.scene, entity, id, component, change) {
                Ok(id) => {
                    context.state.mark_component_processed(entity, id);
                    rewrites.push(ComponentIdPair {
                        sender_id,
                        new_id: id,
                    });
                }
                Err(err) => warn!(
                    "Failed to create component {} of entity {}, skipping: {}",
                    sender_id, entity, err
                ),
            }
        }

        if context.is_server() {
            SceneWriter::send(
                context.transport,
                context.source,
                context.message_priority,
                &CreateComponentsReply {
                    entity,
                    components: rewrites,
                },
            )?;
        }
        Ok(())
    }

    pub fn read_create_attributes(
        context: &mut ReadContext,
        message: CreateAttributes,
    ) -> Result<(), SyncError> {
        let entity = message.entity;
        if !context.ensure_entity(entity, "CreateAttributes") {
            return Ok(());
        }
        let change = context.change();

        for attribute in message.attributes {
            let key = AttributeKey::new(entity, attribute.component, attribute.index);
            let Some(component) = context.scene.component(entity, attribute.component) else {
                return Err(SceneError::ComponentNotFound {
                    entity_id: entity,
                    component_id: attribute.component,
                }
                .into());
            };
            if context.is_server() && component.attribute(attribute.index).is_some() {
                // clients may not overwrite attributes through creation
                return Err(SceneError::AttributeAlreadyExists {
                    entity_id: entity,
                    component_id: attribute.component,
                    index: attribute.index,
                }
                .into());
            }
            context
                .scene
                .create_attribute(key, &attribute.name, attribute.value, change)?;
        }
        Ok(())
    }

    pub fn read_edit_attributes(
        context: &mut ReadContext,
        message: EditAttributes,
    ) -> Result<(), SyncError> {
        let entity = message.entity;
        if !context.ensure_entity(entity, "EditAttributes") {
            return Ok(());
        }
        let change = context.change();
        let interpolates = !context.is_server();

        context.mark_known(entity);
        let interval = match context.state.entity_mut(entity) {
            Some(state) => {
                let interval = state.update_interval_mut();
                interval.record(context.now);
                interval.average()
            }
            None => None,
        }
        .unwrap_or(context.update_period)
            * INTERPOLATION_FUDGE;

        let mut result = Ok(());
        for edited in message.components {
            let Some(component) = context.scene.component(entity, edited.component) else {
                warn!(
                    "Component {} not found in entity {} for EditAttributes, skipping",
                    edited.component, entity
                );
                continue;
            };
            let changes = match read_edit_blob(entity, component, &edited.data) {
                Ok(changes) => changes,
                Err(err) => {
                    warn!("Skipping malformed edit of component {}: {}", edited.component, err);
                    result = Err(err);
                    continue;
                }
            };

            for (index, value) in changes {
                let key = AttributeKey::new(entity, edited.component, index);
                let interpolate = interpolates
                    && context
                        .scene
                        .attribute(key)
                        .map_or(false, |attribute| attribute.interpolates());
                let applied = if interpolate {
                    context.scene.start_attribute_interpolation(key, value, interval)
                } else {
                    context.scene.set_attribute(key, value, change)
                };
                if let Err(err) = applied {
                    warn!("Could not apply edit of {:?}: {}", key, err);
                }
            }
        }
        result
    }

    pub fn read_remove_attributes(
        context: &mut ReadContext,
        message: RemoveAttributes,
    ) -> Result<(), SyncError> {
        let entity = message.entity;
        if !context.scene.contains_entity(entity) {
            warn!("Entity {} not found for RemoveAttributes", entity);
            return Ok(());
        }
        let change = context.change();

        for (component, index) in message.attributes {
            if let Err(err) = context
                .scene
                .remove_attribute(AttributeKey::new(entity, component, index), change)
            {
                warn!("Could not remove attribute: {}", err);
                continue;
            }
            // whatever the source had queued for the slot is void now
            if let Some(state) = context
                .state
                .entity_mut(entity)
                .and_then(|state| state.component_mut(component))
            {
                state.dirty_attributes.set_bit(index, false);
                state.new_and_removed_attributes.remove(&index);
            }
        }
        Ok(())
    }

    pub fn read_remove_components(
        context: &mut ReadContext,
        message: RemoveComponents,
    ) -> Result<(), SyncError> {
        let entity = message.entity;
        if !context.scene.contains_entity(entity) {
            warn!("Entity {} not found for RemoveComponents", entity);
            return Ok(());
        }
        let change = context.change();

        for component in message.components {
            if let Err(err) = context.scene.remove_component(entity, component, change) {
                warn!("Could not remove component: {}", err);
                continue;
            }
            context.state.remove_component_state(entity, component);
        }
        Ok(())
    }

    pub fn read_remove_entity(
        context: &mut ReadContext,
        message: RemoveEntity,
    ) -> Result<(), SyncError> {
        let entity = message.entity;
        if !context.scene.contains_entity(entity) {
            warn!("Entity {} not found for RemoveEntity", entity);
            return Ok(());
        }
        context.scene.remove_entity(entity, context.change())?;
        context.state.remove_entity_state(entity);
        context.state.remove_pending_entity(entity);
        Ok(())
    }

    /// Moves a locally created entity to the id the server assigned.
    pub fn read_create_entity_reply(
        context: &mut ReadContext,
        message: CreateEntityReply,
    ) -> Result<(), SyncError> {
        let old_id = unacked_id(message.sender_entity);
        let new_id = message.new_entity;
        debug!("Entity {} acknowledged as {}", old_id, new_id);

        // an entity removed while waiting still needs its removal sent
        if context.scene.contains_entity(old_id) {
            context.scene.change_entity_id(old_id, new_id)?;
        }
        context.state.change_entity_id(old_id, new_id);
        Self::rename_components(context, new_id, &message.components);
        context.state.requeue_components(new_id);
        Ok(())
    }

    pub fn read_create_components_reply(
        context: &mut ReadContext,
        message: CreateComponentsReply,
    ) -> Result<(), SyncError> {
        Self::rename_components(context, message.entity, &message.components);
        context.state.requeue_components(message.entity);
        Ok(())
    }

    fn rename_components(context: &mut ReadContext, entity: EntityId, pairs: &[ComponentIdPair]) {
        for pair in pairs {
            let old_id = unacked_id(pair.sender_id);
            if context.scene.component(entity, old_id).is_some() {
                if let Err(err) = context
                    .scene
                    .change_component_id(entity, old_id, pair.new_id)
                {
                    warn!("Could not rename component {} to {}: {}", old_id, pair.new_id, err);
                    continue;
                }
            }
            context.state.change_component_id(entity, old_id, pair.new_id);
        }
    }
}
