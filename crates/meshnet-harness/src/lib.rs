//! # meshnet-harness
//!
//! meshnet ノードを決定的にテストするためのシミュレーション環境。
//!
//! - `SimNetwork`: インメモリのメッシュ。マスター宛てのフレームは即座に `SimMaster` が処理する
//! - `SimTransport`: `Transport` 実装。書き込み失敗とリンク断を注入できる
//! - `SimEnv`: `Environment` 実装。仮想時計
//! - `RecordingRegistry`: `Registry` 実装。受け取ったペイロードを記録する
//!
//! ```ignore
//! let key = Key::new(TEST_KEY);
//! let network = SimNetwork::new(SimMaster::new(&key));
//! let mut node = spawn_node(&network, 3, &key, SimEnv::new());
//! node.start();
//! assert_eq!(node.run_once(), Step::Idle);
//! ```

#![forbid(unsafe_code)]

mod registry;
mod sim_env;
mod sim_master;
mod sim_network;
mod sim_transport;

pub use registry::RecordingRegistry;
pub use sim_env::SimEnv;
pub use sim_master::{MasterBehavior, PeerPhase, Received, SimFrame, SimMaster};
pub use sim_network::SimNetwork;
pub use sim_transport::{SimTransport, TransportStats, UNPROVISIONED_ID};

use meshnet_node::{Key, NodeConfig, NodeId};

/// テスト用の事前共有鍵
pub const TEST_KEY: [u8; 16] = [
    0x4d, 0x65, 0x73, 0x68, 0x6e, 0x65, 0x74, 0x2d, 0x74, 0x65, 0x73, 0x74, 0x2d, 0x6b, 0x65, 0x79,
];

/// シミュレーション上のノード
pub type SimNode = meshnet_node::Node<SimTransport, RecordingRegistry, SimEnv>;

/// 既定の設定でノードを作る
///
/// # Panics
/// 既定の設定が不正な場合（起こらない）
pub fn spawn_node(network: &SimNetwork, node_id: NodeId, key: &Key, env: SimEnv) -> SimNode {
    spawn_node_with(network, node_id, key, env, NodeConfig::default())
}

/// 設定を指定してノードを作る
///
/// # Panics
/// `config` が不正な場合
pub fn spawn_node_with(
    network: &SimNetwork,
    node_id: NodeId,
    key: &Key,
    env: SimEnv,
    config: NodeConfig,
) -> SimNode {
    meshnet_node::Node::new(
        node_id,
        key,
        config,
        network.transport(),
        RecordingRegistry::new(),
        env,
    )
    .expect("invalid node config")
}

/// テスト用のログ初期化（`RUST_LOG` で上書きできる）
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}
