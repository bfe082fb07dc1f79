//! # meshnet-node
//!
//! meshnet ノードのプロトコルエンジン。
//!
//! ## 概要
//!
//! ```text
//! start()                       ← ブートハンドシェイク（障害時は restart して再試行）
//!   └── boot_step() ...
//! loop { run_once() }           ← 定常状態（1 呼び出し = 高々 1 単位の仕事）
//!   └── process()
//!         ├── set_state / get_state / ping
//!         ├── heartbeat pong
//!         ├── reading (Registry::next_state)
//!         └── Registry::check_items
//! ```
//!
//! ## ブートハンドシェイク
//!
//! ```text
//! node                                   master
//!  │── booted(uptime) [boot session] ────>│
//!  │<──────────────── configure (0..n) ───│
//!  │── pong(uptime) ─────────────────────>│
//!  │<────────────── configured(S1) ───────│
//!  │   adopt(S1), counters = 0            │
//!  │── pong(uptime) [S1] ────────────────>│
//! ```
//!
//! ## 外部コラボレータ
//!
//! - `Transport` (meshnet-transport): メッシュリンク
//! - `Registry`: ペイロードの解釈とデバイス状態
//! - `Environment`: 時刻と待機
//!
//! いずれもジェネリクスで注入するので、テストでは仮想時計とインメモリの
//! ネットワークに差し替えられる（`meshnet-harness` 参照）。

#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod config;
pub mod env;
pub mod error;
pub mod node;
pub mod registry;
pub mod steady;

pub use boot::BootState;
pub use config::NodeConfig;
pub use env::Environment;
pub use error::{ConfigError, Fault};
pub use node::Node;
pub use registry::Registry;
pub use steady::Step;

pub use meshnet_crypto::Key;
pub use meshnet_proto::{Message, MessageType};
pub use meshnet_transport::{FrameHeader, NodeId, Transport, MASTER_ID};
