use std::collections::BTreeMap;

use super::{
    component::Component,
    ids::{is_local_id, is_unacked_id, IdKind, UniqueIdGenerator},
    ComponentId, EntityId,
};

/// An entity and the components it owns. Components are kept ordered by id
/// so full serialization is deterministic.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    temporary: bool,
    components: BTreeMap<ComponentId, Component>,
    component_ids: UniqueIdGenerator,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            temporary: false,
            components: BTreeMap::new(),
            component_ids: UniqueIdGenerator::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    pub fn is_local(&self) -> bool {
        is_local_id(self.id)
    }

    pub fn is_unacked(&self) -> bool {
        is_unacked_id(self.id)
    }

    pub fn is_replicated(&self) -> bool {
        !self.is_local()
    }

    /// Temporary entities are replicated but not meant to be persisted.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub(crate) fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.keys().copied().collect()
    }

    pub fn component_by_type(&self, type_name: &str) -> Option<&Component> {
        self.components().find(|component| component.type_name() == type_name)
    }

    pub fn has_component_type(&self, type_name: &str) -> bool {
        self.component_by_type(type_name).is_some()
    }

    pub fn num_replicated_components(&self) -> usize {
        self.components()
            .filter(|component| component.is_replicated())
            .count()
    }

    pub(crate) fn next_free_component_id(&mut self, kind: IdKind) -> ComponentId {
        loop {
            let id = self.component_ids.allocate(kind);
            if !self.components.contains_key(&id) {
                return id;
            }
        }
    }

    pub(crate) fn insert_component(&mut self, component: Component) {
        self.components.insert(component.id(), component);
    }

    pub(crate) fn remove_component(&mut self, id: ComponentId) -> Option<Component> {
        self.components.remove(&id)
    }
}
