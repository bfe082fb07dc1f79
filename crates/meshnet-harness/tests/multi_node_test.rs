//! 1 つのマスターに複数のノードをつなぐテスト
//!
//! エンジンはプロセス全体の状態を持たないので、同じプロセス内の
//! 複数ノードは互いに干渉しない。

use meshnet_harness::{init_logging, spawn_node, SimEnv, SimMaster, SimNetwork, TEST_KEY};
use meshnet_node::{BootState, Key, MessageType, Step};

#[test]
fn test_two_nodes_share_master() {
    init_logging();
    let key = Key::new(TEST_KEY);
    let network = SimNetwork::new(SimMaster::new(&key));

    let mut node_a = spawn_node(&network, 3, &key, SimEnv::with_tick(0).with_us_offset(17));
    let mut node_b = spawn_node(&network, 4, &key, SimEnv::with_tick(0).with_us_offset(911));

    node_a.start();
    node_b.start();

    assert_eq!(node_a.boot_state(), BootState::Configured);
    assert_eq!(node_b.boot_state(), BootState::Configured);
    assert_ne!(node_a.session().id(), node_b.session().id());
    assert_eq!(network.master(|m| m.session_of(3)), Some(node_a.session().id()));
    assert_eq!(network.master(|m| m.session_of(4)), Some(node_b.session().id()));

    // b 宛てのコマンドは a に届かない
    assert!(network.master_send(4, MessageType::SetState, &[0xB0]));
    assert_eq!(node_a.run_once(), Step::Idle);
    assert_eq!(node_b.run_once(), Step::Handled(MessageType::SetState));
    assert!(node_a.registry().set_states.is_empty());
    assert_eq!(node_b.registry().set_states, vec![vec![0xB0]]);

    // a の reset は b に影響しない
    let b_session = node_b.session().id();
    assert!(network.master_send(3, MessageType::Reset, &[]));
    assert_eq!(node_a.run_once(), Step::Restarted);
    assert_eq!(node_b.run_once(), Step::Idle);
    assert_eq!(node_b.session().id(), b_session);
}

#[test]
fn test_frame_for_other_node_rejected() {
    init_logging();
    let key = Key::new(TEST_KEY);
    let network = SimNetwork::new(SimMaster::new(&key));

    let mut node_a = spawn_node(&network, 3, &key, SimEnv::with_tick(0));
    let mut node_b = spawn_node(&network, 4, &key, SimEnv::with_tick(0));
    node_a.start();
    node_b.start();
    assert_eq!(node_a.session().id().wrapping_add(1), node_b.session().id());

    // b 向けのフレームを a のセッション ID で作る（ping は届けない）
    network.master_mut(|m| m.ping(4, node_a.session().id()));
    let mut frame = network
        .master_mut(|m| m.command(4, MessageType::SetState, &[0x01]))
        .unwrap();

    // 宛先だけ a に付け替えても認証タグが合わない
    frame.header.to = 3;
    network.inject(frame);
    assert_eq!(node_a.run_once(), Step::Idle);
    assert!(node_a.registry().set_states.is_empty());
}
