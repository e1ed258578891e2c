use std::collections::BTreeMap;

use crate::scene::ComponentId;

use super::diff_mask::DiffMask;

/// What one peer is believed to hold of one component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentSyncState {
    id: ComponentId,
    pub(crate) dirty_attributes: DiffMask,
    /// Dynamic attribute index to `true` when created, `false` when removed
    pub(crate) new_and_removed_attributes: BTreeMap<u8, bool>,
    pub(crate) is_new: bool,
    pub(crate) removed: bool,
    pub(crate) is_in_queue: bool,
}

impl ComponentSyncState {
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            dirty_attributes: DiffMask::new(),
            new_and_removed_attributes: BTreeMap::new(),
            is_new: true,
            removed: false,
            is_in_queue: false,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ComponentId) {
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

    pub fn dirty_attributes(&self) -> &DiffMask {
        &self.dirty_attributes
    }

    pub fn new_and_removed_attributes(&self) -> &BTreeMap<u8, bool> {
        &self.new_and_removed_attributes
    }

    pub fn is_dirty(&self) -> bool {
        self.is_new
            || self.removed
            || !self.dirty_attributes.is_clear()
            || !self.new_and_removed_attributes.is_empty()
    }

    pub fn mark_attribute_dirty(&mut self, index: u8) {
        self.dirty_attributes.set_bit(index, true);
    }

    pub fn mark_attribute_created(&mut self, index: u8) {
        self.new_and_removed_attributes.insert(index, true);
    }

    pub fn mark_attribute_removed(&mut self, index: u8) {
        self.new_and_removed_attributes.insert(index, false);
    }

    /// The peer now holds the current contents.
    pub fn dirty_processed(&mut self) {
        self.dirty_attributes.clear();
        self.new_and_removed_attributes.clear();
        self.is_new = false;
    }

    /// Starts over as a component the peer has never seen. A pending removal
    /// of the previous generation is kept.
    pub(crate) fn start_new_generation(&mut self) {
        self.dirty_attributes.clear();
        self.new_and_removed_attributes.clear();
        self.is_new = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_clears_everything_but_removal() {
        let mut state = ComponentSyncState::new(3);
        assert!(state.is_new());
        state.mark_attribute_dirty(4);
        state.mark_attribute_created(9);
        state.removed = true;

        state.dirty_processed();
        assert!(!state.is_new());
        assert!(state.dirty_attributes().is_clear());
        assert!(state.new_and_removed_attributes().is_empty());
        assert!(state.is_removed());
    }

    #[test]
    fn later_mark_wins_for_dynamic_attributes() {
        let mut state = ComponentSyncState::new(3);
        state.mark_attribute_created(9);
        state.mark_attribute_removed(9);
        assert_eq!(state.new_and_removed_attributes().get(&9), Some(&false));
    }
}
