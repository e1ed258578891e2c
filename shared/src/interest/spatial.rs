use nalgebra::Vector3;

use crate::scene::{AttributeValue, Entity, Transform};

/// Where an entity is and how large it looks, as far as interest management
/// and prioritization are concerned.
pub trait SpatialSource {
    fn position(&self, entity: &Entity) -> Option<Vector3<f32>>;

    /// Surface area of the entity's visual bounding volume. `None` for
    /// entities that are not drawn.
    fn bounding_surface_area(&self, entity: &Entity) -> Option<f32>;

    fn has_physics_body(&self, entity: &Entity) -> bool;
}

/// Reads spatial data from components, looked up by type name.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentSpatialSource {
    /// Component type holding the transform
    pub placeable_type: String,
    /// Name of the `Transform` attribute of `placeable_type`
    pub transform_attribute: String,
    /// Component type that makes an entity visible
    pub mesh_type: String,
    pub rigid_body_type: String,
}

impl Default for ComponentSpatialSource {
    fn default() -> Self {
        Self {
            placeable_type: "Placeable".to_string(),
            transform_attribute: "transform".to_string(),
            mesh_type: "Mesh".to_string(),
            rigid_body_type: "RigidBody".to_string(),
        }
    }
}

impl ComponentSpatialSource {
    fn transform(&self, entity: &Entity) -> Option<Transform> {
        let attribute = entity
            .component_by_type(&self.placeable_type)?
            .attribute_by_name(&self.transform_attribute)?;
        match attribute.value() {
            AttributeValue::Transform(transform) => Some(*transform),
            _ => None,
        }
    }
}

impl SpatialSource for ComponentSpatialSource {
    fn position(&self, entity: &Entity) -> Option<Vector3<f32>> {
        self.transform(entity).map(|transform| transform.position)
    }

    fn bounding_surface_area(&self, entity: &Entity) -> Option<f32> {
        if !entity.has_component_type(&self.mesh_type) {
            return None;
        }
        let size = self.transform(entity)?.scale.abs();
        Some(2.0 * (size.x * size.y + size.y * size.z + size.z * size.x))
    }

    fn has_physics_body(&self, entity: &Entity) -> bool {
        entity.has_component_type(&self.rigid_body_type)
    }
}
