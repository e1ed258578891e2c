use super::{
    attribute::{Attribute, AttributeValue},
    component_kinds::{ComponentKind, ComponentTypeId},
    ids::{is_local_id, is_unacked_id},
    ComponentId, EntityId, SceneError,
};

/// A component instance. Attribute slots `0..num_static_attributes` hold the
/// static attributes of the type; dynamic attributes live above them and can
/// leave holes when removed.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    id: ComponentId,
    type_id: ComponentTypeId,
    type_name: String,
    name: String,
    attributes: Vec<Option<Attribute>>,
    num_static_attributes: usize,
    supports_dynamic_attributes: bool,
}

impl Component {
    pub(crate) fn new(id: ComponentId, kind: &ComponentKind, name: &str) -> Self {
        let attributes = kind
            .static_attributes()
            .iter()
            .enumerate()
            .map(|(index, descriptor)| Some(Attribute::new_static(index as u8, descriptor)))
            .collect::<Vec<_>>();
        Self {
            id,
            type_id: kind.type_id(),
            type_name: kind.type_name().to_string(),
            name: name.to_string(),
            num_static_attributes: attributes.len(),
            attributes,
            supports_dynamic_attributes: kind.supports_dynamic_attributes(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ComponentId) {
        self.id = id;
    }

    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
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

    pub fn num_static_attributes(&self) -> usize {
        self.num_static_attributes
    }

    pub fn supports_dynamic_attributes(&self) -> bool {
        self.supports_dynamic_attributes
    }

    /// All attribute slots, including holes left by removed dynamic attributes.
    pub fn attribute_slots(&self) -> &[Option<Attribute>] {
        &self.attributes
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().flatten()
    }

    pub fn attribute(&self, index: u8) -> Option<&Attribute> {
        self.attributes.get(usize::from(index)).and_then(Option::as_ref)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes().find(|attribute| attribute.name() == name)
    }

    pub fn dynamic_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes().filter(|attribute| attribute.is_dynamic())
    }

    pub(crate) fn set_value(
        &mut self,
        entity_id: EntityId,
        index: u8,
        value: AttributeValue,
    ) -> Result<(), SceneError> {
        let component_id = self.id;
        let attribute = self
            .attributes
            .get_mut(usize::from(index))
            .and_then(Option::as_mut)
            .ok_or(SceneError::AttributeNotFound {
                entity_id,
                component_id,
                index,
            })?;
        if attribute.type_id() != value.type_id() {
            return Err(SceneError::AttributeTypeMismatch {
                index,
                expected: attribute.type_id(),
                actual: value.type_id(),
            });
        }
        attribute.set_value(value);
        Ok(())
    }

    pub(crate) fn create_attribute(
        &mut self,
        entity_id: EntityId,
        index: u8,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), SceneError> {
        if !self.supports_dynamic_attributes {
            return Err(SceneError::DynamicAttributesUnsupported {
                type_name: self.type_name.clone(),
            });
        }
        let slot = usize::from(index);
        if slot < self.num_static_attributes {
            return Err(SceneError::StaticAttribute {
                type_name: self.type_name.clone(),
                index,
            });
        }
        if self.attribute(index).is_some() {
            return Err(SceneError::AttributeAlreadyExists {
                entity_id,
                component_id: self.id,
                index,
            });
        }
        if self.attributes.len() <= slot {
            self.attributes.resize(slot + 1, None);
        }
        self.attributes[slot] = Some(Attribute::new_dynamic(index, name, value));
        Ok(())
    }

    pub(crate) fn remove_attribute(
        &mut self,
        entity_id: EntityId,
        index: u8,
    ) -> Result<Attribute, SceneError> {
        let slot = usize::from(index);
        if slot < self.num_static_attributes {
            return Err(SceneError::StaticAttribute {
                type_name: self.type_name.clone(),
                index,
            });
        }
        let removed = self
            .attributes
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or(SceneError::AttributeNotFound {
                entity_id,
                component_id: self.id,
                index,
            })?;
        while matches!(self.attributes.last(), Some(None)) {
            self.attributes.pop();
        }
        Ok(removed)
    }

    /// The lowest free slot for a new dynamic attribute.
    pub fn next_free_attribute_index(&self) -> Option<u8> {
        (self.num_static_attributes..256)
            .find(|slot| self.attributes.get(*slot).map_or(true, Option::is_none))
            .map(|slot| slot as u8)
    }
}
