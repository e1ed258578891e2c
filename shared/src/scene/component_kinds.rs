use std::collections::HashMap;

use super::attribute::AttributeDescriptor;

pub type ComponentTypeId = u32;

/// Registration record of one component type: its static attribute layout
/// and whether instances may carry dynamic attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentKind {
    type_id: ComponentTypeId,
    type_name: String,
    static_attributes: Vec<AttributeDescriptor>,
    supports_dynamic_attributes: bool,
}

impl ComponentKind {
    pub fn new(type_id: ComponentTypeId, type_name: &str) -> Self {
        Self {
            type_id,
            type_name: type_name.to_string(),
            static_attributes: Vec::new(),
            supports_dynamic_attributes: false,
        }
    }

    /// Appends a static attribute. Indices follow declaration order.
    pub fn with_attribute(mut self, descriptor: AttributeDescriptor) -> Self {
        assert!(
            self.static_attributes.len() < 256,
            "component type {} declares more than 256 attributes",
            self.type_name
        );
        self.static_attributes.push(descriptor);
        self
    }

    pub fn with_dynamic_attributes(mut self) -> Self {
        self.supports_dynamic_attributes = true;
        self
    }

    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn static_attributes(&self) -> &[AttributeDescriptor] {
        &self.static_attributes
    }

    pub fn supports_dynamic_attributes(&self) -> bool {
        self.supports_dynamic_attributes
    }
}

/// Registry of the component types a scene can instantiate
#[derive(Clone, Debug, Default)]
pub struct ComponentKinds {
    kinds: HashMap<ComponentTypeId, ComponentKind>,
}

impl ComponentKinds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component type, replacing any earlier registration of
    /// the same type id.
    pub fn add_kind(&mut self, kind: ComponentKind) -> &mut Self {
        self.kinds.insert(kind.type_id, kind);
        self
    }

    pub fn kind(&self, type_id: ComponentTypeId) -> Option<&ComponentKind> {
        self.kinds.get(&type_id)
    }

    pub fn kind_by_name(&self, type_name: &str) -> Option<&ComponentKind> {
        self.kinds.values().find(|kind| kind.type_name == type_name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
