use nalgebra::Vector3;

use scenesync_shared::{
    is_unacked_id, AttributeChange, AttributeKey, AttributeValue, MessageId, Transform,
};
use scenesync_test::{message_ids, TestNetwork, DYNAMIC, NAME, PLACEABLE, STATS, TICK};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn hp(network: &TestNetwork, client: Option<usize>, entity: u32, stats: u32) -> Option<AttributeValue> {
    let scene = match client {
        Some(index) => network.client(index).scene(),
        None => network.server().scene(),
    };
    scene
        .attribute(AttributeKey::new(entity, stats, 0))
        .map(|attribute| attribute.value().clone())
}

/// Every server side change shows up on every client
#[test]
fn server_changes_reach_all_clients() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();
    let b = network.add_client().unwrap();

    let scene = network.server_mut().scene_mut();
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let stats = scene
        .add_component(entity, STATS, "", AttributeChange::Replicate)
        .unwrap();
    let name = scene
        .add_component(entity, NAME, "label", AttributeChange::Replicate)
        .unwrap();
    scene
        .set_attribute(
            AttributeKey::new(entity, name, 0),
            AttributeValue::String("crate".to_string()),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.settle();

    for client in [a, b] {
        let replica = network.client(client).scene().entity(entity).unwrap();
        assert_eq!(replica.components().count(), 2);
        assert_eq!(replica.component(name).unwrap().name(), "label");
        assert_eq!(
            replica.component(name).unwrap().attribute(0).unwrap().value(),
            &AttributeValue::String("crate".to_string())
        );
    }

    network
        .server_mut()
        .scene_mut()
        .set_attribute(
            AttributeKey::new(entity, stats, 0),
            AttributeValue::Int(77),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.settle();
    assert_eq!(hp(&network, Some(a), entity, stats), Some(AttributeValue::Int(77)));
    assert_eq!(hp(&network, Some(b), entity, stats), Some(AttributeValue::Int(77)));

    network
        .server_mut()
        .scene_mut()
        .remove_component(entity, name, AttributeChange::Replicate)
        .unwrap();
    network.settle();
    for client in [a, b] {
        let replica = network.client(client).scene().entity(entity).unwrap();
        assert!(replica.component(name).is_none());
        assert!(replica.component(stats).is_some());
    }

    network
        .server_mut()
        .scene_mut()
        .remove_entity(entity, AttributeChange::Replicate)
        .unwrap();
    network.settle();
    assert!(network.client(a).scene().is_empty());
    assert!(network.client(b).scene().is_empty());
}

/// Local entities and local-only changes never leave the server
#[test]
fn local_changes_stay_on_the_server() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();

    let scene = network.server_mut().scene_mut();
    let local = scene.create_local_entity(AttributeChange::Replicate);
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let stats = scene
        .add_component(entity, STATS, "", AttributeChange::Replicate)
        .unwrap();
    network.settle();

    network
        .server_mut()
        .scene_mut()
        .set_attribute(
            AttributeKey::new(entity, stats, 0),
            AttributeValue::Int(5),
            AttributeChange::LocalOnly,
        )
        .unwrap();
    network.settle();

    assert!(!network.client(a).scene().contains_entity(local));
    assert_eq!(hp(&network, Some(a), entity, stats), Some(AttributeValue::Int(0)));
}

/// Dynamic attributes are created and removed on the replicas as well
#[test]
fn dynamic_attributes_follow_the_server() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();

    let scene = network.server_mut().scene_mut();
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let dynamic = scene
        .add_component(entity, DYNAMIC, "", AttributeChange::Replicate)
        .unwrap();
    scene
        .create_attribute(
            AttributeKey::new(entity, dynamic, 0),
            "speed",
            AttributeValue::Real(2.5),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.settle();

    let replica = network.client(a).scene().component(entity, dynamic).unwrap();
    assert_eq!(
        replica.attribute_by_name("speed").unwrap().value(),
        &AttributeValue::Real(2.5)
    );

    let scene = network.server_mut().scene_mut();
    scene
        .create_attribute(
            AttributeKey::new(entity, dynamic, 3),
            "title",
            AttributeValue::String("crate".to_string()),
            AttributeChange::Replicate,
        )
        .unwrap();
    scene
        .remove_attribute(AttributeKey::new(entity, dynamic, 0), AttributeChange::Replicate)
        .unwrap();
    network.settle();

    let replica = network.client(a).scene().component(entity, dynamic).unwrap();
    assert!(replica.attribute(0).is_none());
    assert_eq!(replica.attribute(3).unwrap().name(), "title");
}

/// An edit made by one client is applied by the server and relayed to the
/// other clients, but never echoed back
#[test]
fn client_edit_is_relayed_without_echo() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();
    let b = network.add_client().unwrap();
    let c = network.add_client().unwrap();

    let scene = network.server_mut().scene_mut();
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let stats = scene
        .add_component(entity, STATS, "", AttributeChange::Replicate)
        .unwrap();
    network.settle();

    network
        .client_mut(a)
        .scene_mut()
        .set_attribute(
            AttributeKey::new(entity, stats, 0),
            AttributeValue::Int(12),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.client_mut(a).update(TICK);
    network.deliver();
    assert_eq!(hp(&network, None, entity, stats), Some(AttributeValue::Int(12)));

    network.server_mut().update(TICK);
    let outbox = network.server_outbox();
    assert!(outbox.take_for(TestNetwork::connection(a)).is_empty());
    for client in [b, c] {
        assert_eq!(
            message_ids(&outbox.take_for(TestNetwork::connection(client))),
            vec![MessageId::EditAttributes]
        );
    }

    network.settle();
    for client in [a, b, c] {
        assert_eq!(hp(&network, Some(client), entity, stats), Some(AttributeValue::Int(12)));
    }
}

/// A client created entity is given a server id, renamed on its creator and
/// shown to everybody else under that id
#[test]
fn client_created_entity_is_acknowledged() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();
    let b = network.add_client().unwrap();

    let existing = network
        .server_mut()
        .scene_mut()
        .create_entity(0, AttributeChange::Replicate)
        .unwrap();
    network.settle();

    let scene = network.client_mut(a).scene_mut();
    let pending = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    assert!(is_unacked_id(pending));
    let pending_stats = scene
        .add_component(pending, STATS, "", AttributeChange::Replicate)
        .unwrap();
    scene
        .set_attribute(
            AttributeKey::new(pending, pending_stats, 0),
            AttributeValue::Int(9),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.settle();

    let server_ids = network.server().scene().entity_ids();
    assert_eq!(server_ids.len(), 2);
    let created = server_ids
        .into_iter()
        .find(|id| *id != existing)
        .unwrap();
    assert!(!is_unacked_id(created));
    let stats = network
        .server()
        .scene()
        .entity(created)
        .unwrap()
        .component_ids()[0];
    assert_eq!(hp(&network, None, created, stats), Some(AttributeValue::Int(9)));

    for client in [a, b] {
        let scene = network.client(client).scene();
        assert_eq!(scene.len(), 2);
        assert!(!scene.contains_entity(pending));
        assert!(scene.entity(created).unwrap().component(stats).is_some());
    }
    assert_eq!(hp(&network, Some(b), created, stats), Some(AttributeValue::Int(9)));

    // later edits from the creator travel under the new ids
    network
        .client_mut(a)
        .scene_mut()
        .set_attribute(
            AttributeKey::new(created, stats, 0),
            AttributeValue::Int(10),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.settle();
    assert_eq!(hp(&network, Some(b), created, stats), Some(AttributeValue::Int(10)));
}

/// Transform edits are blended in on clients instead of snapping
#[test]
fn interpolated_attribute_blends_on_client() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();

    let scene = network.server_mut().scene_mut();
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let placeable = scene
        .add_component(entity, PLACEABLE, "", AttributeChange::Replicate)
        .unwrap();
    network.settle();

    let key = AttributeKey::new(entity, placeable, 0);
    let target = Transform::from_position(Vector3::new(10.0, 0.0, 0.0));
    network
        .server_mut()
        .scene_mut()
        .set_attribute(key, AttributeValue::Transform(target), AttributeChange::Replicate)
        .unwrap();
    network.server_mut().update(TICK);
    network.deliver();

    let position_x = |network: &TestNetwork| match network.client(a).scene().attribute(key).unwrap().value() {
        AttributeValue::Transform(transform) => transform.position.x,
        other => panic!("unexpected value {:?}", other),
    };
    assert!(network.client(a).scene().is_interpolating(key));
    assert_eq!(position_x(&network), 0.0);

    network.client_mut(a).update(TICK);
    let halfway = position_x(&network);
    assert!(halfway > 0.0 && halfway < 10.0, "got {}", halfway);

    network.client_mut(a).update(TICK);
    network.client_mut(a).update(TICK);
    assert!(!network.client(a).scene().is_interpolating(key));
    assert_eq!(position_x(&network), 10.0);

    // the server copy was set directly
    assert_eq!(
        network.server().scene().attribute(key).unwrap().value(),
        &AttributeValue::Transform(target)
    );
}
