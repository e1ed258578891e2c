use scenesync_client::{
    ClientJoinedEvent, ClientLeftEvent, ConnectEvent, ConnectionState, DisconnectEvent,
};
use scenesync_server::{DisconnectEvent as ServerDisconnectEvent, LoginEvent};
use scenesync_shared::{
    AttributeChange, AttributeKey, AttributeValue, Login, LoginReply, MessageId, ProtocolMessage,
    RemoveEntity, WireMessage,
};
use scenesync_test::{message_ids, TestNetwork, STATS};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A logging in client is told its id and hears about itself first
#[test]
fn login_reply_comes_before_join_announcements() {
    init();
    let mut network = TestNetwork::new();
    let first = network.add_silent_client();
    network
        .client_mut(first)
        .connect(b"hello".to_vec())
        .unwrap();

    // only the Login is in flight
    let upstream = network.client_outbox(first).take();
    assert_eq!(upstream.len(), 1);
    let login = Login::from_bytes(&upstream[0].1.payload).unwrap();
    assert_eq!(login.payload, b"hello".to_vec());
    network
        .server_mut()
        .receive_message(TestNetwork::connection(first), upstream[0].1.clone());

    let downstream = network.server_outbox().take_for(TestNetwork::connection(first));
    assert_eq!(
        message_ids(&downstream),
        vec![MessageId::LoginReply, MessageId::ClientJoined]
    );
    let reply = LoginReply::from_bytes(&downstream[0].payload).unwrap();
    assert!(reply.success);
    assert_eq!(reply.user_id, 1);

    let mut events = network.server_mut().take_events();
    let logins: Vec<_> = events.read::<LoginEvent>().collect();
    assert_eq!(logins, vec![(1, TestNetwork::connection(first), b"hello".to_vec())]);
}

/// Users learn about each other on login and logout
#[test]
fn users_join_and_leave() {
    init();
    let mut network = TestNetwork::new();
    let a = network.add_client().unwrap();
    let b = network.add_client().unwrap();

    assert!(network.client(a).is_logged_in());
    assert!(network.client(b).is_logged_in());
    let id_a = network.client(a).user_id().unwrap();
    let id_b = network.client(b).user_id().unwrap();
    assert_ne!(id_a, id_b);

    assert_eq!(network.client(a).joined_users().copied().collect::<Vec<_>>(), vec![id_b]);
    assert_eq!(network.client(b).joined_users().copied().collect::<Vec<_>>(), vec![id_a]);

    let mut events = network.client_mut(a).take_events();
    assert_eq!(events.read::<ConnectEvent>().collect::<Vec<_>>(), vec![id_a]);
    assert_eq!(events.read::<ClientJoinedEvent>().collect::<Vec<_>>(), vec![id_b]);
    network.client_mut(b).take_events();

    network.disconnect_client(b);
    network.deliver();

    let mut events = network.client_mut(a).take_events();
    assert_eq!(events.read::<ClientLeftEvent>().collect::<Vec<_>>(), vec![id_b]);
    assert_eq!(network.client(a).joined_users().count(), 0);
    assert!(network.client_mut(b).take_events().has::<DisconnectEvent>());

    let mut server_events = network.server_mut().take_events();
    assert_eq!(
        server_events.read::<ServerDisconnectEvent>().collect::<Vec<_>>(),
        vec![id_b]
    );
    assert_eq!(network.server().logged_in_users().count(), 1);
}

/// Scene traffic from a connection that never logged in has no effect
#[test]
fn scene_messages_before_login_are_ignored() {
    init();
    let mut network = TestNetwork::new();
    let index = network.add_silent_client();

    let remove = RemoveEntity { entity: 1 };
    let entity = network
        .server_mut()
        .scene_mut()
        .create_entity(0, AttributeChange::Replicate)
        .unwrap();
    assert_eq!(entity, 1);
    network.server_mut().receive_message(
        TestNetwork::connection(index),
        WireMessage::reliable(MessageId::RemoveEntity.to_u16(), 100, remove.to_bytes()),
    );

    assert!(network.server().scene().contains_entity(entity));
    assert!(network.server_mut().take_events().is_empty());
    assert!(network.server_outbox().is_empty());
}

/// After a reconnect the client's scene is rebuilt from the server's
#[test]
fn reconnect_replaces_the_scene() {
    init();
    let mut network = TestNetwork::new();
    let index = network.add_client().unwrap();

    let scene = network.server_mut().scene_mut();
    let kept = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    let stats = scene
        .add_component(kept, STATS, "", AttributeChange::Replicate)
        .unwrap();
    let gone = scene.create_entity(0, AttributeChange::Replicate).unwrap();
    network.settle();
    assert!(network.client(index).scene().contains_entity(gone));

    network.disconnect_client(index);
    assert_eq!(network.client(index).connection_state(), ConnectionState::Disconnected);

    let scene = network.server_mut().scene_mut();
    scene
        .remove_entity(gone, AttributeChange::Replicate)
        .unwrap();
    scene
        .set_attribute(
            AttributeKey::new(kept, stats, 0),
            AttributeValue::Int(42),
            AttributeChange::Replicate,
        )
        .unwrap();
    network.tick();

    // still the stale copy while offline
    assert!(network.client(index).scene().contains_entity(gone));

    network.reconnect_client(index).unwrap();
    let scene = network.client(index).scene();
    assert!(!scene.contains_entity(gone));
    assert_eq!(
        scene.attribute(AttributeKey::new(kept, stats, 0)).unwrap().value(),
        &AttributeValue::Int(42)
    );
    assert_eq!(network.client(index).user_id(), Some(2));
}
