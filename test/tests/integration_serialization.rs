use proptest::prelude::*;

use scenesync_shared::{
    read_edit_blob, read_full_component_data, write_edit_blob, write_full_component,
    AttributeChange, AttributeKey, AttributeValue, Component, CreateEntity, EditEncoding,
    HostType, MessageId, ProtocolMessage, Scene, SyncConfig, SyncManager, SERVER_CONNECTION,
};
use scenesync_test::{component_kinds, RecordingTransport, DYNAMIC, NAME, STATS};

fn attribute_list(component: &Component) -> Vec<(u8, String, AttributeValue)> {
    component
        .attributes()
        .map(|attribute| {
            (
                attribute.index(),
                attribute.name().to_string(),
                attribute.value().clone(),
            )
        })
        .collect()
}

/// Two static components and one dynamic component survive a CreateEntity
#[test]
fn create_entity_carries_every_attribute() {
    let mut scene = Scene::new(HostType::Server, component_kinds());
    let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let stats = scene
        .add_component(entity, STATS, "", AttributeChange::Replicate)
        .unwrap();
    let name = scene
        .add_component(entity, NAME, "sign", AttributeChange::Replicate)
        .unwrap();
    let dynamic = scene
        .add_component(entity, DYNAMIC, "extra", AttributeChange::Replicate)
        .unwrap();
    scene
        .set_attribute(
            AttributeKey::new(entity, stats, 1),
            AttributeValue::Real(3.5),
            AttributeChange::Replicate,
        )
        .unwrap();
    scene
        .set_attribute(
            AttributeKey::new(entity, name, 0),
            AttributeValue::String("exit".to_string()),
            AttributeChange::Replicate,
        )
        .unwrap();
    scene
        .create_attribute(
            AttributeKey::new(entity, dynamic, 0),
            "visible",
            AttributeValue::Bool(true),
            AttributeChange::Replicate,
        )
        .unwrap();
    scene
        .create_attribute(
            AttributeKey::new(entity, dynamic, 4),
            "tags",
            AttributeValue::StringList(vec!["a".to_string(), "b".to_string()]),
            AttributeChange::Replicate,
        )
        .unwrap();

    let source = scene.entity(entity).unwrap();
    let message = CreateEntity {
        entity,
        temporary: false,
        components: source.components().map(write_full_component).collect(),
    };
    let decoded = CreateEntity::from_bytes(&message.to_bytes()).unwrap();
    assert_eq!(decoded, message);

    let kinds = component_kinds();
    for component in decoded.components {
        let kind = kinds.kind(component.type_id).unwrap();
        let data = read_full_component_data(kind, component.id, &component.data).unwrap();
        let original = source.component(component.id).unwrap();
        let statics: Vec<AttributeValue> = original
            .attributes()
            .filter(|attribute| !attribute.is_dynamic())
            .map(|attribute| attribute.value().clone())
            .collect();
        assert_eq!(data.static_values, statics);

        let dynamics: Vec<(u8, String, AttributeValue)> = data
            .dynamic_attributes
            .into_iter()
            .map(|attribute| (attribute.index, attribute.name, attribute.value))
            .collect();
        let expected: Vec<(u8, String, AttributeValue)> = original
            .dynamic_attributes()
            .map(|attribute| {
                (
                    attribute.index(),
                    attribute.name().to_string(),
                    attribute.value().clone(),
                )
            })
            .collect();
        assert_eq!(dynamics, expected);
    }

    // applied to an empty scene, the message rebuilds the same entity
    let mut replica = Scene::new(HostType::Client, component_kinds());
    let mut outbox = RecordingTransport::new();
    let mut manager = SyncManager::new(HostType::Client, SyncConfig::default());
    manager.add_connection(SERVER_CONNECTION, &replica);
    manager
        .handle_message(
            SERVER_CONNECTION,
            MessageId::CreateEntity.to_u16(),
            &message.to_bytes(),
            &mut replica,
            &mut outbox,
        )
        .unwrap();

    let copy = replica.entity(entity).unwrap();
    assert_eq!(copy.components().count(), 3);
    for component in source.components() {
        let received = copy.component(component.id()).unwrap();
        assert_eq!(received.type_id(), component.type_id());
        assert_eq!(received.name(), component.name());
        assert_eq!(attribute_list(received), attribute_list(component));
    }
    assert!(outbox.is_empty());
}

#[test]
fn edit_encoding_switches_to_bitmask_when_smaller() {
    assert_eq!(EditEncoding::choose(1, 100), EditEncoding::Indices);
    assert_eq!(EditEncoding::choose(1, 16), EditEncoding::Indices);
    assert_eq!(EditEncoding::choose(1, 15), EditEncoding::Bitmask);
    assert_eq!(EditEncoding::choose(3, 2), EditEncoding::Bitmask);
}

proptest! {
    /// Whatever subset of a component changed, the receiver reads back the
    /// same indices and values
    #[test]
    fn edit_blob_lists_changed_attributes(
        values in proptest::collection::vec(any::<i32>(), 1..40),
        picks in proptest::collection::vec(any::<bool>(), 40),
    ) {
        let mut scene = Scene::new(HostType::Server, component_kinds());
        let entity = scene.create_entity(0, AttributeChange::Replicate).unwrap();
        let dynamic = scene
            .add_component(entity, DYNAMIC, "", AttributeChange::Replicate)
            .unwrap();
        for (index, value) in values.iter().enumerate() {
            scene
                .create_attribute(
                    AttributeKey::new(entity, dynamic, index as u8),
                    &format!("value{}", index),
                    AttributeValue::Int(*value),
                    AttributeChange::Replicate,
                )
                .unwrap();
        }
        let changed: Vec<u8> = (0..values.len())
            .filter(|index| picks[*index])
            .map(|index| index as u8)
            .collect();

        let component = scene.component(entity, dynamic).unwrap();
        let blob = write_edit_blob(component, &changed);
        let read = read_edit_blob(entity, component, &blob).unwrap();

        let expected: Vec<(u8, AttributeValue)> = changed
            .iter()
            .map(|index| (*index, AttributeValue::Int(values[usize::from(*index)])))
            .collect();
        prop_assert_eq!(read, expected);
    }
}
