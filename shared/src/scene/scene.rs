use std::collections::{BTreeMap, VecDeque};

use log::warn;

use crate::types::{ConnectionId, HostType};

use super::{
    action::{ExecutedAction, ExecutionType},
    attribute::{Attribute, AttributeValue},
    component::Component,
    component_kinds::{ComponentKinds, ComponentTypeId},
    entity::Entity,
    events::{AttributeChange, SceneEvent},
    ids::{IdKind, UniqueIdGenerator},
    interpolation::{AttributeInterpolation, AttributeKey},
    ComponentId, EntityId, SceneError,
};

/// An entity-component scene that queues a `SceneEvent` for every mutation
/// not made with `AttributeChange::Disconnected`.
///
/// A scene on the server (the authority) allocates replicated ids, a scene on
/// a client allocates unacked ids until the server assigns real ones.
pub struct Scene {
    host_type: HostType,
    kinds: ComponentKinds,
    entities: BTreeMap<EntityId, Entity>,
    entity_ids: UniqueIdGenerator,
    events: VecDeque<SceneEvent>,
    interpolations: Vec<AttributeInterpolation>,
    executed_actions: Vec<ExecutedAction>,
}

impl Scene {
    pub fn new(host_type: HostType, kinds: ComponentKinds) -> Self {
        Self {
            host_type,
            kinds,
            entities: BTreeMap::new(),
            entity_ids: UniqueIdGenerator::new(),
            events: VecDeque::new(),
            interpolations: Vec::new(),
            executed_actions: Vec::new(),
        }
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn is_authority(&self) -> bool {
        self.host_type.is_server()
    }

    pub fn component_kinds(&self) -> &ComponentKinds {
        &self.kinds
    }

    // Entities

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Next unused replicated id on the authority, next unused unacked id
    /// elsewhere.
    pub fn next_free_id(&mut self) -> EntityId {
        let kind = if self.is_authority() {
            IdKind::Replicated
        } else {
            IdKind::Unacked
        };
        self.next_free(kind)
    }

    pub fn next_free_local_id(&mut self) -> EntityId {
        self.next_free(IdKind::Local)
    }

    fn next_free(&mut self, kind: IdKind) -> EntityId {
        loop {
            let id = self.entity_ids.allocate(kind);
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }

    /// Creates an entity. An `id` of 0 allocates `next_free_id()`.
    pub fn create_entity(
        &mut self,
        id: EntityId,
        change: AttributeChange,
    ) -> Result<EntityId, SceneError> {
        let id = if id == 0 { self.next_free_id() } else { id };
        if self.entities.contains_key(&id) {
            return Err(SceneError::EntityAlreadyExists { entity_id: id });
        }
        let entity = Entity::new(id);
        let replicated = entity.is_replicated();
        self.entities.insert(id, entity);
        self.emit(change, |change| SceneEvent::EntityCreated {
            entity: id,
            change,
            replicated,
        });
        Ok(id)
    }

    pub fn create_local_entity(&mut self, change: AttributeChange) -> EntityId {
        let id = self.next_free_local_id();
        self.entities.insert(id, Entity::new(id));
        self.emit(change, |change| SceneEvent::EntityCreated {
            entity: id,
            change,
            replicated: false,
        });
        id
    }

    pub fn set_temporary(&mut self, id: EntityId, temporary: bool) -> Result<(), SceneError> {
        self.entity_mut(id)?.set_temporary(temporary);
        Ok(())
    }

    pub fn remove_entity(
        &mut self,
        id: EntityId,
        change: AttributeChange,
    ) -> Result<Entity, SceneError> {
        let replicated = self.entity_ref(id)?.is_replicated();
        self.emit(change, |change| SceneEvent::EntityRemoved {
            entity: id,
            change,
            replicated,
        });
        self.interpolations.retain(|interpolation| interpolation.key.entity != id);
        self.entities
            .remove(&id)
            .ok_or(SceneError::EntityNotFound { entity_id: id })
    }

    /// Renames an entity without emitting any event.
    pub fn change_entity_id(&mut self, old_id: EntityId, new_id: EntityId) -> Result<(), SceneError> {
        if old_id == new_id {
            return Ok(());
        }
        if self.entities.contains_key(&new_id) {
            return Err(SceneError::EntityAlreadyExists { entity_id: new_id });
        }
        let mut entity = self
            .entities
            .remove(&old_id)
            .ok_or(SceneError::EntityNotFound { entity_id: old_id })?;
        entity.set_id(new_id);
        self.entities.insert(new_id, entity);
        for interpolation in self.interpolations.iter_mut() {
            if interpolation.key.entity == old_id {
                interpolation.key.entity = new_id;
            }
        }
        Ok(())
    }

    /// Removes every entity.
    pub fn clear(&mut self, change: AttributeChange) {
        for id in self.entity_ids() {
            if let Err(err) = self.remove_entity(id, change) {
                warn!("Failed to clear entity {}: {}", id, err);
            }
        }
        self.interpolations.clear();
    }

    // Components

    pub fn component(&self, entity: EntityId, component: ComponentId) -> Option<&Component> {
        self.entities.get(&entity)?.component(component)
    }

    /// Adds a component with a freshly allocated id. Components of local
    /// entities always get local ids.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        type_id: ComponentTypeId,
        name: &str,
        change: AttributeChange,
    ) -> Result<ComponentId, SceneError> {
        let kind = if self.entity_ref(entity)?.is_local() {
            IdKind::Local
        } else if self.is_authority() {
            IdKind::Replicated
        } else {
            IdKind::Unacked
        };
        let id = self.entity_mut(entity)?.next_free_component_id(kind);
        self.create_component(entity, id, type_id, name, change)
    }

    /// Adds a component that is never replicated.
    pub fn add_local_component(
        &mut self,
        entity: EntityId,
        type_id: ComponentTypeId,
        name: &str,
        change: AttributeChange,
    ) -> Result<ComponentId, SceneError> {
        let id = self.entity_mut(entity)?.next_free_component_id(IdKind::Local);
        self.create_component(entity, id, type_id, name, change)
    }

    /// Creates a component with an explicit id. An `id` of 0 behaves like
    /// `add_component`.
    pub fn create_component(
        &mut self,
        entity: EntityId,
        id: ComponentId,
        type_id: ComponentTypeId,
        name: &str,
        change: AttributeChange,
    ) -> Result<ComponentId, SceneError> {
        if id == 0 {
            return self.add_component(entity, type_id, name, change);
        }
        let kind = self
            .kinds
            .kind(type_id)
            .ok_or(SceneError::UnknownComponentType { type_id })?;
        let component = Component::new(id, kind, name);
        let replicated = component.is_replicated();
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .ok_or(SceneError::EntityNotFound { entity_id: entity })?;
        if entity_ref.component(id).is_some() {
            return Err(SceneError::ComponentAlreadyExists {
                entity_id: entity,
                component_id: id,
            });
        }
        let replicated = replicated && entity_ref.is_replicated();
        entity_ref.insert_component(component);
        self.emit(change, |change| SceneEvent::ComponentAdded {
            entity,
            component: id,
            change,
            replicated,
        });
        Ok(id)
    }

    pub fn remove_component(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        change: AttributeChange,
    ) -> Result<Component, SceneError> {
        let replicated = self.component_ref(entity, component)?.is_replicated()
            && self.entity_ref(entity)?.is_replicated();
        self.emit(change, |change| SceneEvent::ComponentRemoved {
            entity,
            component,
            change,
            replicated,
        });
        self.interpolations.retain(|interpolation| {
            interpolation.key.entity != entity || interpolation.key.component != component
        });
        self.entity_mut(entity)?
            .remove_component(component)
            .ok_or(SceneError::ComponentNotFound {
                entity_id: entity,
                component_id: component,
            })
    }

    /// Renames a component without emitting any event.
    pub fn change_component_id(
        &mut self,
        entity: EntityId,
        old_id: ComponentId,
        new_id: ComponentId,
    ) -> Result<(), SceneError> {
        if old_id == new_id {
            return Ok(());
        }
        let entity_ref = self.entity_mut(entity)?;
        if entity_ref.component(new_id).is_some() {
            return Err(SceneError::ComponentAlreadyExists {
                entity_id: entity,
                component_id: new_id,
            });
        }
        let mut component =
            entity_ref
                .remove_component(old_id)
                .ok_or(SceneError::ComponentNotFound {
                    entity_id: entity,
                    component_id: old_id,
                })?;
        component.set_id(new_id);
        entity_ref.insert_component(component);
        for interpolation in self.interpolations.iter_mut() {
            if interpolation.key.entity == entity && interpolation.key.component == old_id {
                interpolation.key.component = new_id;
            }
        }
        Ok(())
    }

    // Attributes

    pub fn attribute(&self, key: AttributeKey) -> Option<&Attribute> {
        self.component(key.entity, key.component)?.attribute(key.index)
    }

    pub fn set_attribute(
        &mut self,
        key: AttributeKey,
        value: AttributeValue,
        change: AttributeChange,
    ) -> Result<(), SceneError> {
        self.component_mut(key.entity, key.component)?
            .set_value(key.entity, key.index, value)?;
        self.emit_attribute_changed(key, change);
        Ok(())
    }

    /// Queues an `AttributeChanged` event for a value that was written
    /// without one.
    pub fn emit_attribute_changed(&mut self, key: AttributeKey, change: AttributeChange) {
        let Some(entity) = self.entities.get(&key.entity) else {
            return;
        };
        let Some(component) = entity.component(key.component) else {
            return;
        };
        let interpolates = component
            .attribute(key.index)
            .map_or(false, Attribute::interpolates);
        let replicated = entity.is_replicated() && component.is_replicated();
        self.emit(change, |change| SceneEvent::AttributeChanged {
            entity: key.entity,
            component: key.component,
            index: key.index,
            change,
            replicated,
            interpolates,
        });
    }

    pub fn create_attribute(
        &mut self,
        key: AttributeKey,
        name: &str,
        value: AttributeValue,
        change: AttributeChange,
    ) -> Result<(), SceneError> {
        let replicated = self.is_replicated(key.entity, key.component)?;
        self.component_mut(key.entity, key.component)?
            .create_attribute(key.entity, key.index, name, value)?;
        self.emit(change, |change| SceneEvent::AttributeAdded {
            entity: key.entity,
            component: key.component,
            index: key.index,
            change,
            replicated,
        });
        Ok(())
    }

    pub fn remove_attribute(
        &mut self,
        key: AttributeKey,
        change: AttributeChange,
    ) -> Result<Attribute, SceneError> {
        let replicated = self.is_replicated(key.entity, key.component)?;
        let removed = self
            .component_mut(key.entity, key.component)?
            .remove_attribute(key.entity, key.index)?;
        self.interpolations
            .retain(|interpolation| interpolation.key != key);
        self.emit(change, |change| SceneEvent::AttributeRemoved {
            entity: key.entity,
            component: key.component,
            index: key.index,
            change,
            replicated,
        });
        Ok(removed)
    }

    // Interpolation

    /// Blends the attribute from its current value to `end` over `length`
    /// seconds. A running blend of the same attribute restarts from the
    /// current value. A non-positive length applies `end` at once.
    pub fn start_attribute_interpolation(
        &mut self,
        key: AttributeKey,
        end: AttributeValue,
        length: f32,
    ) -> Result<(), SceneError> {
        let attribute = self.attribute(key).ok_or(SceneError::AttributeNotFound {
            entity_id: key.entity,
            component_id: key.component,
            index: key.index,
        })?;
        if attribute.type_id() != end.type_id() {
            return Err(SceneError::AttributeTypeMismatch {
                index: key.index,
                expected: attribute.type_id(),
                actual: end.type_id(),
            });
        }
        if !attribute.type_id().is_interpolable() {
            return Err(SceneError::NotInterpolable {
                index: key.index,
                type_id: attribute.type_id(),
            });
        }
        let start = attribute.value().clone();

        self.end_attribute_interpolation(key);
        if length <= 0.0 {
            return self.set_attribute(key, end, AttributeChange::LocalOnly);
        }
        self.interpolations.push(AttributeInterpolation {
            key,
            start,
            end,
            time: 0.0,
            length,
        });
        Ok(())
    }

    /// Stops a running blend, leaving the attribute at its current value.
    pub fn end_attribute_interpolation(&mut self, key: AttributeKey) -> bool {
        let before = self.interpolations.len();
        self.interpolations
            .retain(|interpolation| interpolation.key != key);
        before != self.interpolations.len()
    }

    pub fn is_interpolating(&self, key: AttributeKey) -> bool {
        self.interpolations
            .iter()
            .any(|interpolation| interpolation.key == key)
    }

    /// Advances every running blend. Intermediate values are applied as
    /// local-only changes.
    pub fn update_interpolations(&mut self, dt: f32) {
        let mut interpolations = std::mem::take(&mut self.interpolations);
        interpolations.retain_mut(|interpolation| {
            let (value, finished) = interpolation.advance(dt);
            if let Err(err) = self.set_attribute(interpolation.key, value, AttributeChange::LocalOnly)
            {
                warn!("Dropping interpolation of {:?}: {}", interpolation.key, err);
                return false;
            }
            !finished
        });
        self.interpolations = interpolations;
    }

    // Actions

    /// Triggers an entity action. `LOCAL` runs it here at once, the other
    /// flags are routed by the sync manager.
    pub fn trigger_action(
        &mut self,
        entity: EntityId,
        name: &str,
        params: Vec<String>,
        execution: ExecutionType,
    ) -> Result<(), SceneError> {
        self.entity_ref(entity)?;
        if execution.contains(ExecutionType::LOCAL) {
            self.execute_action(entity, name, params.clone(), None);
        }
        self.events.push_back(SceneEvent::ActionTriggered {
            entity,
            name: name.to_string(),
            params,
            execution,
        });
        Ok(())
    }

    pub fn execute_action(
        &mut self,
        entity: EntityId,
        name: &str,
        params: Vec<String>,
        sender: Option<ConnectionId>,
    ) {
        self.executed_actions.push(ExecutedAction {
            entity,
            name: name.to_string(),
            params,
            sender,
        });
    }

    pub fn take_executed_actions(&mut self) -> Vec<ExecutedAction> {
        std::mem::take(&mut self.executed_actions)
    }

    // Events

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, change: AttributeChange, event: impl FnOnce(AttributeChange) -> SceneEvent) {
        let change = change.resolve();
        if change == AttributeChange::Disconnected {
            return;
        }
        self.events.push_back(event(change));
    }

    // Lookup helpers

    fn entity_ref(&self, id: EntityId) -> Result<&Entity, SceneError> {
        self.entities
            .get(&id)
            .ok_or(SceneError::EntityNotFound { entity_id: id })
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        self.entities
            .get_mut(&id)
            .ok_or(SceneError::EntityNotFound { entity_id: id })
    }

    fn component_ref(&self, entity: EntityId, component: ComponentId) -> Result<&Component, SceneError> {
        self.entity_ref(entity)?
            .component(component)
            .ok_or(SceneError::ComponentNotFound {
                entity_id: entity,
                component_id: component,
            })
    }

    pub(crate) fn component_mut(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Result<&mut Component, SceneError> {
        self.entity_mut(entity)?
            .component_mut(component)
            .ok_or(SceneError::ComponentNotFound {
                entity_id: entity,
                component_id: component,
            })
    }

    fn is_replicated(&self, entity: EntityId, component: ComponentId) -> Result<bool, SceneError> {
        Ok(self.entity_ref(entity)?.is_replicated()
            && self.component_ref(entity, component)?.is_replicated())
    }
}
