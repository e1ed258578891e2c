use scenesync_shared::{
    AttributeChange, ExecutedAction, ExecutionType, SERVER_CONNECTION,
};
use scenesync_test::{TestNetwork, TICK};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn network_with_entity(clients: usize) -> (TestNetwork, u32) {
    let mut network = TestNetwork::new();
    for _ in 0..clients {
        network.add_client().unwrap();
    }
    let entity = network
        .server_mut()
        .scene_mut()
        .create_entity(0, AttributeChange::Replicate)
        .unwrap();
    network.settle();
    (network, entity)
}

fn server_actions(network: &mut TestNetwork) -> Vec<ExecutedAction> {
    network.server_mut().scene_mut().take_executed_actions()
}

fn client_actions(network: &mut TestNetwork, index: usize) -> Vec<ExecutedAction> {
    network.client_mut(index).scene_mut().take_executed_actions()
}

/// A peer action runs on the triggering client right away and on every other
/// client through the server, which does not run it itself
#[test]
fn peer_action_reaches_other_clients() {
    init();
    let (mut network, entity) = network_with_entity(3);

    network
        .client_mut(0)
        .scene_mut()
        .trigger_action(
            entity,
            "Wave",
            vec!["left".to_string()],
            ExecutionType::LOCAL | ExecutionType::PEERS,
        )
        .unwrap();
    network.client_mut(0).update(TICK);
    network.deliver();

    let local = client_actions(&mut network, 0);
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].sender, None);

    for index in [1, 2] {
        let actions = client_actions(&mut network, index);
        assert_eq!(
            actions,
            vec![ExecutedAction {
                entity,
                name: "Wave".to_string(),
                params: vec!["left".to_string()],
                sender: Some(SERVER_CONNECTION),
            }]
        );
    }
    assert!(server_actions(&mut network).is_empty());
}

/// A server action triggered on a client runs on the server only
#[test]
fn server_action_from_client_runs_on_server() {
    init();
    let (mut network, entity) = network_with_entity(2);

    network
        .client_mut(1)
        .scene_mut()
        .trigger_action(entity, "Open", Vec::new(), ExecutionType::SERVER)
        .unwrap();
    network.client_mut(1).update(TICK);
    network.deliver();

    let actions = server_actions(&mut network);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "Open");
    assert_eq!(actions[0].sender, Some(TestNetwork::connection(1)));
    assert!(client_actions(&mut network, 0).is_empty());
    assert!(client_actions(&mut network, 1).is_empty());
}

/// Actions triggered on the server run there and reach every client
#[test]
fn server_triggered_actions() {
    init();
    let (mut network, entity) = network_with_entity(2);

    let scene = network.server_mut().scene_mut();
    scene
        .trigger_action(entity, "Ring", Vec::new(), ExecutionType::SERVER)
        .unwrap();
    scene
        .trigger_action(entity, "Flash", Vec::new(), ExecutionType::PEERS)
        .unwrap();
    network.server_mut().update(TICK);
    network.deliver();

    let actions = server_actions(&mut network);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "Ring");
    assert_eq!(actions[0].sender, None);

    for index in [0, 1] {
        let actions = client_actions(&mut network, index);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "Flash");
    }
}

/// `send_action_to` targets a single user
#[test]
fn action_sent_to_one_user() {
    init();
    let (mut network, entity) = network_with_entity(2);

    network
        .server_mut()
        .send_action_to(TestNetwork::connection(1), entity, "Whisper", vec!["hi".to_string()])
        .unwrap();
    network.deliver();

    assert!(client_actions(&mut network, 0).is_empty());
    let actions = client_actions(&mut network, 1);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].params, vec!["hi".to_string()]);

    // unknown users are reported
    assert!(network
        .server_mut()
        .send_action_to(99, entity, "Whisper", Vec::new())
        .is_err());
}
