mod action;
mod attribute;
mod component;
mod component_kinds;
mod entity;
mod error;
mod events;
mod ids;
mod interpolation;
mod scene;

pub use action::{ExecutedAction, ExecutionType};
pub use attribute::{Attribute, AttributeDescriptor, AttributeTypeId, AttributeValue, Transform};
pub use component::Component;
pub use component_kinds::{ComponentKind, ComponentKinds, ComponentTypeId};
pub use entity::Entity;
pub use error::SceneError;
pub use events::{AttributeChange, SceneEvent};
pub use ids::{
    is_local_id, is_unacked_id, unacked_id, wire_id, ComponentId, EntityId, IdKind,
    UniqueIdGenerator, FIRST_LOCAL_ID, FIRST_UNACKED_ID, LAST_REPLICATED_ID, LAST_UNACKED_ID,
};
pub use interpolation::AttributeKey;
pub use scene::Scene;
