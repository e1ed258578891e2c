use std::collections::HashMap;

use nalgebra::Vector3;

use crate::{
    scene::{EntityId, Scene},
    types::ConnectionId,
};

use super::{
    filters::{InterestFilter, RelevanceParams},
    observer::Observer,
    spatial::SpatialSource,
};

/// Per connection, per entity bookkeeping of the interest checks
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RelevanceRecord {
    pub last_updated: Option<f64>,
    pub last_considered: Option<f64>,
    pub last_result: Option<bool>,
}

/// Judges which entities each connection should hear about. Owned by the
/// `SyncManager` of the server.
pub struct InterestManager {
    filter: Box<dyn InterestFilter>,
    spatial: Box<dyn SpatialSource>,
    forward_axis: Vector3<f32>,
    records: HashMap<ConnectionId, HashMap<EntityId, RelevanceRecord>>,
}

impl InterestManager {
    pub fn new(filter: Box<dyn InterestFilter>, spatial: Box<dyn SpatialSource>) -> Self {
        Self {
            filter,
            spatial,
            forward_axis: -Vector3::z(),
            records: HashMap::new(),
        }
    }

    /// Observer-local direction that counts as forward
    pub fn with_forward_axis(mut self, axis: Vector3<f32>) -> Self {
        self.set_forward_axis(axis);
        self
    }

    pub fn set_forward_axis(&mut self, axis: Vector3<f32>) {
        self.forward_axis = axis;
    }

    /// Whether `entity` is relevant to `connection`. Entities that are not
    /// in the scene, entities without a position, and connections without
    /// an observer are always relevant.
    pub fn check_relevance(
        &mut self,
        connection: ConnectionId,
        observer: Option<&Observer>,
        scene: &Scene,
        entity: EntityId,
        now: f64,
    ) -> bool {
        let Some(observer) = observer else {
            return true;
        };
        let Some(position) = scene
            .entity(entity)
            .and_then(|entity| self.spatial.position(entity))
        else {
            return true;
        };

        let record = self
            .records
            .entry(connection)
            .or_default()
            .entry(entity)
            .or_default();

        if let (Some(considered), Some(result)) = (record.last_considered, record.last_result) {
            if now - considered < self.filter.reconsider_interval() {
                return result;
            }
        }

        let relative_position = position - observer.position;
        let distance_squared = relative_position.norm_squared();
        let observer_forward = observer.forward(&self.forward_axis).normalize();
        let dot = if distance_squared > 0.0 {
            observer_forward.dot(&relative_position.normalize())
        } else {
            1.0
        };

        let params = RelevanceParams {
            connection,
            entity,
            relative_position,
            observer_forward,
            dot,
            distance_squared,
            now,
            last_updated: record.last_updated,
            last_considered: record.last_considered,
            last_result: record.last_result,
        };
        let result = self.filter.filter(&params);
        record.last_considered = Some(now);
        record.last_result = Some(result);
        result
    }

    /// Notes that `entity` was sent to `connection` at `now`
    pub fn record_update(&mut self, connection: ConnectionId, entity: EntityId, now: f64) {
        self.records
            .entry(connection)
            .or_default()
            .entry(entity)
            .or_default()
            .last_updated = Some(now);
    }

    pub fn timestamps(&self, connection: ConnectionId, entity: EntityId) -> Option<&RelevanceRecord> {
        self.records.get(&connection)?.get(&entity)
    }

    pub fn remove_connection(&mut self, connection: ConnectionId) {
        self.records.remove(&connection);
    }

    pub fn remove_entity(&mut self, entity: EntityId) {
        for records in self.records.values_mut() {
            records.remove(&entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{UnitQuaternion, Vector3};

    use super::*;
    use crate::{
        interest::{
            filters::{DistanceFilter, FieldOfViewFilter},
            spatial::ComponentSpatialSource,
        },
        scene::{
            AttributeChange, AttributeDescriptor, AttributeKey, AttributeTypeId, AttributeValue,
            ComponentKind, ComponentKinds, Transform,
        },
        types::HostType,
    };

    const PLACEABLE: u32 = 20;

    fn scene() -> Scene {
        let mut kinds = ComponentKinds::new();
        kinds.add_kind(ComponentKind::new(PLACEABLE, "Placeable").with_attribute(
            AttributeDescriptor::new("transform", AttributeTypeId::Transform),
        ));
        Scene::new(HostType::Server, kinds)
    }

    fn spawn(scene: &mut Scene, position: Vector3<f32>) -> (EntityId, AttributeKey) {
        let entity = scene.create_entity(0, AttributeChange::Disconnected).unwrap();
        let placeable = scene
            .add_component(entity, PLACEABLE, "", AttributeChange::Disconnected)
            .unwrap();
        let key = AttributeKey::new(entity, placeable, 0);
        move_to(scene, key, position);
        (entity, key)
    }

    fn move_to(scene: &mut Scene, key: AttributeKey, position: Vector3<f32>) {
        scene
            .set_attribute(
                key,
                AttributeValue::Transform(Transform::from_position(position)),
                AttributeChange::Disconnected,
            )
            .unwrap();
    }

    fn distance_manager(max_distance: f32, reconsider: f64) -> InterestManager {
        InterestManager::new(
            Box::new(DistanceFilter::new(max_distance).with_reconsider_interval(reconsider)),
            Box::new(ComponentSpatialSource::default()),
        )
    }

    #[test]
    fn missing_observer_or_position_is_relevant() {
        let mut scene = scene();
        let mut manager = distance_manager(1.0, 0.0);
        let (far, _) = spawn(&mut scene, Vector3::new(0.0, 0.0, -100.0));
        let bare = scene.create_entity(0, AttributeChange::Disconnected).unwrap();
        let observer = Observer::at(Vector3::zeros());

        assert!(manager.check_relevance(1, None, &scene, far, 0.0));
        assert!(manager.check_relevance(1, Some(&observer), &scene, bare, 0.0));
        assert!(manager.check_relevance(1, Some(&observer), &scene, 999, 0.0));
        assert!(!manager.check_relevance(1, Some(&observer), &scene, far, 0.0));
    }

    #[test]
    fn verdict_is_reused_inside_reconsider_interval() {
        let mut scene = scene();
        let mut manager = distance_manager(10.0, 1.0);
        let (entity, key) = spawn(&mut scene, Vector3::new(0.0, 0.0, -5.0));
        let observer = Observer::at(Vector3::zeros());

        assert!(manager.check_relevance(1, Some(&observer), &scene, entity, 0.0));
        move_to(&mut scene, key, Vector3::new(0.0, 0.0, -50.0));
        assert!(manager.check_relevance(1, Some(&observer), &scene, entity, 0.5));
        assert!(!manager.check_relevance(1, Some(&observer), &scene, entity, 1.0));

        let record = manager.timestamps(1, entity).unwrap();
        assert_eq!(record.last_considered, Some(1.0));
        assert_eq!(record.last_result, Some(false));
    }

    #[test]
    fn field_of_view_follows_observer_orientation() {
        let mut scene = scene();
        let mut manager = InterestManager::new(
            Box::new(FieldOfViewFilter::from_half_angle(0.5, 0.0)),
            Box::new(ComponentSpatialSource::default()),
        );
        let (entity, _) = spawn(&mut scene, Vector3::new(10.0, 0.0, 0.0));

        let ahead = Observer::at(Vector3::zeros());
        assert!(!manager.check_relevance(1, Some(&ahead), &scene, entity, 0.0));

        // -Z turned a quarter turn around Y points at +X
        let turned = Observer::new(
            Vector3::zeros(),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -std::f32::consts::FRAC_PI_2),
        );
        assert!(manager.check_relevance(2, Some(&turned), &scene, entity, 0.0));
    }

    #[test]
    fn records_are_dropped_with_connection_and_entity() {
        let mut scene = scene();
        let mut manager = distance_manager(10.0, 0.0);
        let (entity, _) = spawn(&mut scene, Vector3::zeros());
        manager.record_update(1, entity, 3.0);
        manager.record_update(2, entity, 4.0);
        assert_eq!(manager.timestamps(1, entity).unwrap().last_updated, Some(3.0));

        manager.remove_connection(1);
        assert!(manager.timestamps(1, entity).is_none());
        manager.remove_entity(entity);
        assert!(manager.timestamps(2, entity).is_none());
    }
}
