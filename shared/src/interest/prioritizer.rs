use crate::scene::Entity;

use super::{observer::Observer, spatial::SpatialSource};

/// Relevance of entities with a physics body
pub const PHYSICS_RELEVANCE: f32 = 10.0;
/// Relevance of every other entity
pub const DEFAULT_RELEVANCE: f32 = 1.0;
/// Squared distances are floored to this before dividing
pub const MIN_DISTANCE_SQUARED: f32 = 1e-6;

/// How urgently an entity's changes should reach one observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityPriority {
    pub priority: f32,
    pub relevance: f32,
}

impl EntityPriority {
    /// Seconds between updates when the flush runs every `base_period`
    /// seconds. Infinite priority means every flush.
    pub fn update_interval(&self, base_period: f32) -> f32 {
        let weight = self.priority * self.relevance;
        if weight.is_infinite() {
            return 0.0;
        }
        base_period / weight
    }
}

/// Scores entities for one observer.
pub trait EntityPrioritizer {
    fn compute_priority(&self, entity: &Entity, observer: Option<&Observer>) -> EntityPriority;
}

/// Approximates screen coverage: `area² / distance²` for visible spatial
/// entities, infinite for everything else.
pub struct DefaultEntityPrioritizer {
    spatial: Box<dyn SpatialSource>,
}

impl DefaultEntityPrioritizer {
    pub fn new(spatial: Box<dyn SpatialSource>) -> Self {
        Self { spatial }
    }
}

impl EntityPrioritizer for DefaultEntityPrioritizer {
    fn compute_priority(&self, entity: &Entity, observer: Option<&Observer>) -> EntityPriority {
        let relevance = if self.spatial.has_physics_body(entity) {
            PHYSICS_RELEVANCE
        } else {
            DEFAULT_RELEVANCE
        };

        let position = self.spatial.position(entity);
        let area = self
            .spatial
            .bounding_surface_area(entity)
            .filter(|area| *area > 0.0);
        let priority = match (position, area, observer) {
            (Some(position), Some(area), Some(observer)) => {
                let distance_squared =
                    (position - observer.position).norm_squared().max(MIN_DISTANCE_SQUARED);
                area * area / distance_squared
            }
            _ => f32::INFINITY,
        };

        EntityPriority {
            priority,
            relevance,
        }
    }
}
