//! 受信経路の認証・再送防止テスト
//!
//! 改ざん・種別の付け替え・再送・別鍵のフレームがすべて黙って捨てられ、
//! reset だけはカウンタ検査より先に処理されることを確認する。

use meshnet_harness::{
    init_logging, spawn_node, SimEnv, SimFrame, SimMaster, SimNetwork, SimNode, TEST_KEY,
};
use meshnet_node::{BootState, FrameHeader, Key, MessageType, Step, MASTER_ID};
use meshnet_proto::MAX_PAYLOAD_LEN;
use proptest::prelude::*;

const NODE: u8 = 3;

fn configured_node() -> (SimNetwork, SimNode) {
    init_logging();
    let key = Key::new(TEST_KEY);
    let network = SimNetwork::new(SimMaster::new(&key));
    let mut node = spawn_node(&network, NODE, &key, SimEnv::with_tick(0));
    node.start();
    assert_eq!(node.boot_state(), BootState::Configured);
    (network, node)
}

#[test]
fn test_replayed_frame_dropped() {
    let (network, mut node) = configured_node();

    assert!(network.master_send(NODE, MessageType::SetState, &[0x01]));
    assert_eq!(node.run_once(), Step::Handled(MessageType::SetState));

    let frame = network.last_delivered_to(NODE).unwrap();
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert_eq!(node.registry().set_states.len(), 1);
}

#[test]
fn test_tampered_payload_dropped() {
    let (network, mut node) = configured_node();
    let mut frame = network
        .master_mut(|m| m.command(NODE, MessageType::SetState, &[0x10, 0x20]))
        .unwrap();

    frame.bytes[4] ^= 0x01;
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert!(node.registry().set_states.is_empty());
}

#[test]
fn test_tampered_counter_dropped() {
    let (network, mut node) = configured_node();
    let mut frame = network
        .master_mut(|m| m.command(NODE, MessageType::SetState, &[0x10]))
        .unwrap();

    frame.bytes[3] = frame.bytes[3].wrapping_add(5);
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert!(node.registry().set_states.is_empty());
}

#[test]
fn test_retagged_frame_dropped() {
    let (network, mut node) = configured_node();
    let mut frame = network
        .master_mut(|m| m.command(NODE, MessageType::SetState, &[]))
        .unwrap();

    // 本体はそのままで、ヘッダーの種別だけ reset に書き換える
    frame.header = FrameHeader::new(MASTER_ID, NODE, MessageType::Reset.tag());
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert_eq!(node.boot_state(), BootState::Configured);
}

#[test]
fn test_spoofed_sender_dropped() {
    let (network, mut node) = configured_node();
    let mut frame = network
        .master_mut(|m| m.command(NODE, MessageType::SetState, &[0x01]))
        .unwrap();

    frame.header.from = 9;
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert!(node.registry().set_states.is_empty());
}

#[test]
fn test_frame_under_foreign_key_dropped() {
    let (network, mut node) = configured_node();

    // 別の鍵で同じハンドシェイクを済ませたマスターは同じセッション ID を持つ
    let rogue_key = Key::new([0x55; 16]);
    let rogue_network = SimNetwork::new(SimMaster::new(&rogue_key));
    let mut rogue_node = spawn_node(&rogue_network, NODE, &rogue_key, SimEnv::with_tick(0));
    rogue_node.start();
    assert_eq!(rogue_node.session().id(), node.session().id());

    let frame = rogue_network
        .master_mut(|m| m.command(NODE, MessageType::SetState, &[0x66]))
        .unwrap();
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert!(node.registry().set_states.is_empty());
}

#[test]
fn test_truncated_frame_dropped() {
    let (network, mut node) = configured_node();
    let mut frame = network
        .master_mut(|m| m.command(NODE, MessageType::SetState, &[0x01, 0x02]))
        .unwrap();

    frame.bytes.truncate(7);
    network.inject(frame);
    assert_eq!(node.run_once(), Step::Idle);
    assert!(node.registry().set_states.is_empty());
}

#[test]
fn test_reset_honoured_before_counter_check() {
    let (network, mut node) = configured_node();

    // 古いカウンタの reset を先に作っておく
    let stale_reset = network
        .master_mut(|m| m.command(NODE, MessageType::Reset, &[]))
        .unwrap();
    assert!(network.master_send(NODE, MessageType::SetState, &[0x01]));
    assert_eq!(node.run_once(), Step::Handled(MessageType::SetState));

    network.inject(stale_reset);
    assert_eq!(
        node.process(),
        Err(meshnet_node::Fault::ResetRequested { from: MASTER_ID })
    );
}

#[test]
fn test_reset_in_foreign_session_ignored() {
    let (network, mut node) = configured_node();
    let foreign = node.session().id().wrapping_add(1);

    network.master_mut(|m| m.ping(NODE, foreign));
    assert!(network.master_send(NODE, MessageType::Reset, &[]));
    assert_eq!(node.run_once(), Step::Idle);
    assert_eq!(node.boot_state(), BootState::Configured);
}

#[test]
fn test_inject_routes_by_header() {
    let (network, _node) = configured_node();
    let frame = SimFrame {
        header: FrameHeader::new(MASTER_ID, 42, MessageType::Ping.tag()),
        bytes: vec![0; 14],
    };
    network.inject(frame);
    assert_eq!(network.pending_for(42), 1);
    assert_eq!(network.pending_for(NODE), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// 新しいフレームはちょうど 1 回だけ、届いた順に受理される
    #[test]
    fn prop_each_fresh_command_applied_once(
        commands in proptest::collection::vec(
            (proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LEN), any::<bool>()),
            1..16,
        )
    ) {
        let (network, mut node) = configured_node();

        for (payload, replay) in &commands {
            prop_assert!(network.master_send(NODE, MessageType::SetState, payload));
            prop_assert_eq!(node.run_once(), Step::Handled(MessageType::SetState));
            if *replay {
                let frame = network.last_delivered_to(NODE).unwrap();
                network.inject(frame);
                prop_assert_eq!(node.run_once(), Step::Idle);
            }
        }

        let expected: Vec<Vec<u8>> = commands.into_iter().map(|(p, _)| p).collect();
        prop_assert_eq!(&node.registry().set_states, &expected);
    }
}
