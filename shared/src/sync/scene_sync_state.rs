use std::collections::{HashMap, VecDeque};

use log::warn;

use crate::{
    scene::{ComponentId, EntityId},
    types::ConnectionId,
};

use super::{component_sync_state::ComponentSyncState, entity_sync_state::EntitySyncState};

/// Everything one connection is believed to hold of the scene, plus the
/// queue of entities whose differences still have to be sent to it.
///
/// Queues hold ids only. They are resolved through the state maps when
/// popped, so erasing a state never leaves anything dangling.
#[derive(Clone, Debug)]
pub struct SceneSyncState {
    connection: ConnectionId,
    filters_entities: bool,
    entities: HashMap<EntityId, EntitySyncState>,
    dirty_queue: VecDeque<EntityId>,
    pending_entities: VecDeque<EntityId>,
}

impl SceneSyncState {
    /// `filters_entities` enables the admission check of
    /// `mark_entity_dirty_with`. Only the server filters.
    pub fn new(connection: ConnectionId, filters_entities: bool) -> Self {
        Self {
            connection,
            filters_entities,
            entities: HashMap::new(),
            dirty_queue: VecDeque::new(),
            pending_entities: VecDeque::new(),
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn filters_entities(&self) -> bool {
        self.filters_entities
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.dirty_queue.clear();
        self.pending_entities.clear();
    }

    // Lookup

    pub fn entity(&self, id: EntityId) -> Option<&EntitySyncState> {
        self.entities.get(&id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntitySyncState> {
        self.entities.get_mut(&id)
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids = self.entities.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    /// Entities waiting for the next flush, in queue order
    pub fn dirty_entities(&self) -> impl Iterator<Item = &EntityId> {
        self.dirty_queue.iter()
    }

    pub fn has_dirty_entities(&self) -> bool {
        !self.dirty_queue.is_empty()
    }

    fn entity_or_insert(&mut self, id: EntityId) -> &mut EntitySyncState {
        self.entities
            .entry(id)
            .or_insert_with(|| EntitySyncState::new(id))
    }

    fn enqueue_entity(&mut self, id: EntityId) {
        if let Some(state) = self.entities.get_mut(&id) {
            if !state.is_in_queue {
                state.is_in_queue = true;
                self.dirty_queue.push_back(id);
            }
        }
    }

    // Entities

    /// Ensures a state exists for the entity and queues it once. Returns
    /// whether the entity is tracked for this connection.
    pub fn mark_entity_dirty(&mut self, id: EntityId) -> bool {
        self.mark_entity_dirty_with(id, |_| true)
    }

    /// Like `mark_entity_dirty`, but when this state filters entities and
    /// does not track `id` yet, `admit` decides whether it may. A rejected
    /// entity is remembered as pending and not queued.
    pub fn mark_entity_dirty_with(
        &mut self,
        id: EntityId,
        admit: impl FnOnce(EntityId) -> bool,
    ) -> bool {
        if self.filters_entities {
            if self.has_pending_entity(id) {
                return false;
            }
            if !self.entities.contains_key(&id) && !admit(id) {
                self.pending_entities.push_back(id);
                return false;
            }
        }

        let state = self.entity_or_insert(id);
        if state.removed && !state.is_new {
            // Same id reused after a removal the peer has not heard about yet
            state.start_new_generation();
        }
        self.enqueue_entity(id);
        true
    }

    pub fn mark_entity_removed(&mut self, id: EntityId) {
        self.remove_pending_entity(id);
        let Some(state) = self.entities.get_mut(&id) else {
            return;
        };
        if state.is_new {
            if state.removed {
                // Drop the unsent generation, the earlier removal still stands
                state.start_new_generation();
                state.is_new = false;
            } else {
                self.remove_entity_state(id);
                return;
            }
        } else {
            state.removed = true;
        }
        self.enqueue_entity(id);
    }

    /// The connection now holds the entity as it is.
    pub fn mark_entity_processed(&mut self, id: EntityId) {
        self.entity_or_insert(id).dirty_processed();
    }

    pub fn remove_from_queue(&mut self, id: EntityId) {
        if let Some(state) = self.entities.get_mut(&id) {
            if state.is_in_queue {
                state.is_in_queue = false;
                self.dirty_queue.retain(|queued| *queued != id);
            }
            state.clear_queue();
        }
    }

    pub fn remove_entity_state(&mut self, id: EntityId) -> Option<EntitySyncState> {
        self.remove_from_queue(id);
        self.entities.remove(&id)
    }

    pub fn change_entity_id(&mut self, old_id: EntityId, new_id: EntityId) {
        if old_id == new_id {
            return;
        }
        let Some(mut state) = self.entities.remove(&old_id) else {
            return;
        };
        if self.entities.contains_key(&new_id) {
            warn!(
                "Entity {} replaces the existing sync state of entity {} for connection {}",
                old_id, new_id, self.connection
            );
            self.remove_entity_state(new_id);
        }
        state.set_id(new_id);
        for queued in self.dirty_queue.iter_mut() {
            if *queued == old_id {
                *queued = new_id;
            }
        }
        self.entities.insert(new_id, state);
    }

    /// Pops the next queued entity.
    pub(crate) fn pop_dirty_entity(&mut self) -> Option<EntityId> {
        while let Some(id) = self.dirty_queue.pop_front() {
            if let Some(state) = self.entities.get_mut(&id) {
                state.is_in_queue = false;
                return Some(id);
            }
        }
        None
    }

    /// Puts a tracked entity back at the end of the queue.
    pub(crate) fn requeue_entity(&mut self, id: EntityId) {
        self.enqueue_entity(id);
    }

    // Components

    /// Marks the component and its entity dirty. Skipped for pending entities.
    pub fn mark_component_dirty(&mut self, id: EntityId, component: ComponentId) {
        if self.has_pending_entity(id) || !self.mark_entity_dirty(id) {
            return;
        }
        if let Some(state) = self.entities.get_mut(&id) {
            state.mark_component_dirty(component);
        }
    }

    /// Queues the entity and all of its components for inspection on the
    /// next flush.
    pub fn requeue_components(&mut self, id: EntityId) {
        let Some(state) = self.entities.get_mut(&id) else {
            return;
        };
        state.requeue_components();
        self.enqueue_entity(id);
    }

    pub fn mark_component_removed(&mut self, id: EntityId, component: ComponentId) {
        let Some(state) = self.entities.get_mut(&id) else {
            return;
        };
        state.mark_component_removed(component);
        self.enqueue_entity(id);
    }

    pub fn mark_component_processed(&mut self, id: EntityId, component: ComponentId) {
        self.entity_or_insert(id)
            .component_or_insert(component)
            .dirty_processed();
    }

    pub fn remove_component_state(&mut self, id: EntityId, component: ComponentId) {
        if let Some(state) = self.entities.get_mut(&id) {
            state.remove_component_state(component);
        }
    }

    pub fn change_component_id(&mut self, id: EntityId, old_id: ComponentId, new_id: ComponentId) {
        if let Some(state) = self.entities.get_mut(&id) {
            state.change_component_id(old_id, new_id);
        }
    }

    // Attributes

    pub fn mark_attribute_dirty(&mut self, id: EntityId, component: ComponentId, index: u8) {
        if let Some(state) = self.mark_component(id, component) {
            state.mark_attribute_dirty(index);
        }
    }

    pub fn mark_attribute_created(&mut self, id: EntityId, component: ComponentId, index: u8) {
        if let Some(state) = self.mark_component(id, component) {
            state.mark_attribute_created(index);
        }
    }

    pub fn mark_attribute_removed(&mut self, id: EntityId, component: ComponentId, index: u8) {
        if let Some(state) = self.mark_component(id, component) {
            state.mark_attribute_removed(index);
        }
    }

    fn mark_component(
        &mut self,
        id: EntityId,
        component: ComponentId,
    ) -> Option<&mut ComponentSyncState> {
        self.mark_component_dirty(id, component);
        self.entities.get_mut(&id)?.component_mut(component)
    }

    // Pending entities

    pub fn has_pending_entities(&self) -> bool {
        !self.pending_entities.is_empty()
    }

    pub fn has_pending_entity(&self, id: EntityId) -> bool {
        self.pending_entities.contains(&id)
    }

    pub fn pending_entity_ids(&self) -> Vec<EntityId> {
        self.pending_entities.iter().copied().collect()
    }

    pub fn next_pending_entity_id(&self) -> Option<EntityId> {
        self.pending_entities.front().copied()
    }

    pub fn remove_pending_entity(&mut self, id: EntityId) {
        self.pending_entities.retain(|pending| *pending != id);
    }

    /// Moves a pending entity into the queue as new. Returns false when the
    /// entity was not pending.
    pub fn mark_pending_entity_dirty(&mut self, id: EntityId) -> bool {
        if !self.has_pending_entity(id) {
            return false;
        }
        self.remove_pending_entity(id);
        self.entity_or_insert(id);
        self.enqueue_entity(id);
        true
    }

    pub fn mark_pending_entities_dirty(&mut self) {
        for id in self.pending_entity_ids() {
            self.mark_pending_entity_dirty(id);
        }
    }
}
