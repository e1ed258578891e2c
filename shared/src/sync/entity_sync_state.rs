use std::collections::{HashMap, VecDeque};

use crate::scene::{ComponentId, EntityId};

use super::component_sync_state::ComponentSyncState;

/// Inbound updates closer together than this are ignored by `UpdateInterval`
pub const MIN_UPDATE_INTERVAL_SAMPLE: f32 = 0.005;
/// Inbound updates further apart than this are ignored by `UpdateInterval`
pub const MAX_UPDATE_INTERVAL_SAMPLE: f32 = 0.5;

/// Running average of the time between updates received for an entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateInterval {
    last_received: Option<f64>,
    average: f32,
}

impl UpdateInterval {
    /// Records an update received at `now` seconds.
    pub fn record(&mut self, now: f64) {
        let Some(last_received) = self.last_received.replace(now) else {
            return;
        };
        let sample = (now - last_received) as f32;
        if !(MIN_UPDATE_INTERVAL_SAMPLE..MAX_UPDATE_INTERVAL_SAMPLE).contains(&sample) {
            return;
        }
        if self.average == 0.0 {
            self.average = sample;
        } else {
            self.average = 0.5 * sample + 0.5 * self.average;
        }
    }

    /// Average interval in seconds, once at least one usable sample exists
    pub fn average(&self) -> Option<f32> {
        if self.average > 0.0 {
            Some(self.average)
        } else {
            None
        }
    }
}

/// What one peer is believed to hold of one entity.
#[derive(Clone, Debug)]
pub struct EntitySyncState {
    id: EntityId,
    pub(crate) is_new: bool,
    pub(crate) removed: bool,
    pub(crate) is_in_queue: bool,
    components: HashMap<ComponentId, ComponentSyncState>,
    dirty_queue: VecDeque<ComponentId>,
    update_interval: UpdateInterval,
    pub(crate) last_sent: Option<f64>,
}

impl EntitySyncState {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            is_new: true,
            removed: false,
            is_in_queue: false,
            components: HashMap::new(),
            dirty_queue: VecDeque::new(),
            update_interval: UpdateInterval::default(),
            last_sent: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_in_queue(&self) -> bool {
        self.is_in_queue
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentSyncState> {
        self.components.get(&id)
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSyncState> {
        self.components.get_mut(&id)
    }

    pub(crate) fn component_or_insert(&mut self, id: ComponentId) -> &mut ComponentSyncState {
        self.components
            .entry(id)
            .or_insert_with(|| ComponentSyncState::new(id))
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        let mut ids = self.components.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    /// Components waiting for the next flush, in queue order
    pub fn dirty_components(&self) -> impl Iterator<Item = &ComponentId> {
        self.dirty_queue.iter()
    }

    pub fn update_interval(&self) -> &UpdateInterval {
        &self.update_interval
    }

    pub(crate) fn update_interval_mut(&mut self) -> &mut UpdateInterval {
        &mut self.update_interval
    }

    pub fn mark_component_dirty(&mut self, id: ComponentId) {
        let state = self.component_or_insert(id);
        if state.removed && !state.is_new {
            // Same id reused after a removal the peer has not heard about yet
            state.start_new_generation();
        }
        self.enqueue_component(id);
    }

    pub fn mark_component_removed(&mut self, id: ComponentId) {
        let Some(state) = self.components.get_mut(&id) else {
            return;
        };
        if state.is_new {
            if state.removed {
                // Drop the unsent generation, the earlier removal still stands
                state.dirty_processed();
            } else {
                self.remove_from_queue(id);
                self.components.remove(&id);
                return;
            }
        } else {
            state.removed = true;
        }
        self.enqueue_component(id);
    }

    /// Queues every component again without touching its flags
    pub(crate) fn requeue_components(&mut self) {
        for id in self.component_ids() {
            self.enqueue_component(id);
        }
    }

    fn enqueue_component(&mut self, id: ComponentId) {
        if let Some(state) = self.components.get_mut(&id) {
            if !state.is_in_queue {
                state.is_in_queue = true;
                self.dirty_queue.push_back(id);
            }
        }
    }

    pub fn remove_from_queue(&mut self, id: ComponentId) {
        if let Some(state) = self.components.get_mut(&id) {
            if state.is_in_queue {
                state.is_in_queue = false;
                self.dirty_queue.retain(|queued| *queued != id);
            }
        }
    }

    pub(crate) fn pop_dirty_component(&mut self) -> Option<ComponentId> {
        while let Some(id) = self.dirty_queue.pop_front() {
            if let Some(state) = self.components.get_mut(&id) {
                state.is_in_queue = false;
                return Some(id);
            }
        }
        None
    }

    pub(crate) fn clear_queue(&mut self) {
        for id in self.dirty_queue.drain(..) {
            if let Some(state) = self.components.get_mut(&id) {
                state.is_in_queue = false;
            }
        }
    }

    pub fn remove_component_state(&mut self, id: ComponentId) -> Option<ComponentSyncState> {
        self.remove_from_queue(id);
        self.components.remove(&id)
    }

    pub fn change_component_id(&mut self, old_id: ComponentId, new_id: ComponentId) {
        if old_id == new_id {
            return;
        }
        let Some(mut state) = self.components.remove(&old_id) else {
            return;
        };
        state.set_id(new_id);
        for queued in self.dirty_queue.iter_mut() {
            if *queued == old_id {
                *queued = new_id;
            }
        }
        self.components.insert(new_id, state);
    }

    /// The peer now holds every component of this entity as it is.
    pub fn dirty_processed(&mut self) {
        self.clear_queue();
        for state in self.components.values_mut() {
            state.dirty_processed();
        }
        self.is_new = false;
    }

    /// Starts over as an entity the peer has never seen. A pending removal of
    /// the previous generation is kept.
    pub(crate) fn start_new_generation(&mut self) {
        self.dirty_queue.clear();
        self.components.clear();
        self.is_new = true;
        self.last_sent = None;
    }
}
