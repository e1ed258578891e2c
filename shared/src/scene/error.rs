use thiserror::Error;

use super::{attribute::AttributeTypeId, ComponentId, EntityId};

/// Errors returned by `Scene` mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Entity {entity_id} not found in scene")]
    EntityNotFound { entity_id: EntityId },

    #[error("Entity {entity_id} already exists in scene")]
    EntityAlreadyExists { entity_id: EntityId },

    #[error("Component {component_id} not found on entity {entity_id}")]
    ComponentNotFound {
        entity_id: EntityId,
        component_id: ComponentId,
    },

    #[error("Component {component_id} already exists on entity {entity_id}")]
    ComponentAlreadyExists {
        entity_id: EntityId,
        component_id: ComponentId,
    },

    #[error("Component type {type_id} is not registered")]
    UnknownComponentType { type_id: u32 },

    #[error("Attribute {index} not found in component {component_id} of entity {entity_id}")]
    AttributeNotFound {
        entity_id: EntityId,
        component_id: ComponentId,
        index: u8,
    },

    #[error("Attribute index {index} is already in use in component {component_id} of entity {entity_id}")]
    AttributeAlreadyExists {
        entity_id: EntityId,
        component_id: ComponentId,
        index: u8,
    },

    #[error("Attribute index {index} is static in component type {type_name} and cannot be created or removed")]
    StaticAttribute { type_name: String, index: u8 },

    #[error("Component type {type_name} does not support dynamic attributes")]
    DynamicAttributesUnsupported { type_name: String },

    #[error("Attribute {index} holds {expected:?} values, got {actual:?}")]
    AttributeTypeMismatch {
        index: u8,
        expected: AttributeTypeId,
        actual: AttributeTypeId,
    },

    #[error("Attribute {index} of type {type_id:?} cannot be interpolated")]
    NotInterpolable { index: u8, type_id: AttributeTypeId },
}
