use nalgebra::Vector3;

use scenesync_server::Server;
use scenesync_shared::{
    AttributeChange, AttributeKey, AttributeValue, ComponentSpatialSource, DistanceFilter,
    InterestManager, Observer, Scene, Transform,
};
use scenesync_test::{server_config, TestNetwork, PLACEABLE};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn place(scene: &mut Scene, x: f32) -> u32 {
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let placeable = scene
        .add_component(entity, PLACEABLE, "", AttributeChange::Replicate)
        .unwrap();
    scene
        .set_attribute(
            AttributeKey::new(entity, placeable, 0),
            AttributeValue::Transform(Transform::from_position(Vector3::new(x, 0.0, 0.0))),
            AttributeChange::Replicate,
        )
        .unwrap();
    entity
}

/// Entities far from the reported observer are held back until the observer
/// comes close
#[test]
fn distant_entities_arrive_when_observer_approaches() {
    init();
    let mut network = TestNetwork::with_server(|kinds, transport| {
        let interest = InterestManager::new(
            Box::new(DistanceFilter::new(10.0)),
            Box::new(ComponentSpatialSource::default()),
        );
        Server::with_plugins(server_config(), kinds, transport, Some(interest), None)
    });
    let a = network.add_client().unwrap();
    let b = network.add_client().unwrap();

    network
        .client_mut(a)
        .set_observer(Observer::at(Vector3::zeros()));
    network.tick();

    let scene = network.server_mut().scene_mut();
    let near = place(scene, 1.0);
    let far = place(scene, 100.0);
    network.settle();

    assert!(network.client(a).scene().contains_entity(near));
    assert!(!network.client(a).scene().contains_entity(far));
    // without an observer everything is relevant
    assert!(network.client(b).scene().contains_entity(far));

    network
        .client_mut(a)
        .set_observer(Observer::at(Vector3::new(95.0, 0.0, 0.0)));
    network.settle();
    assert!(network.client(a).scene().contains_entity(far));
}
