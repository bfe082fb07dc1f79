//! # meshnet-session
//!
//! ノードとマスターの間のセッション（通信エポック）を管理する。
//!
//! ## セッションの構成
//!
//! - **session_id**: 再ネゴシエーションを開始した側が選ぶ。受信側はそのまま採用する
//! - **own_counter**: 送信メッセージごとに 1 ずつ増える（セッション変更で 0 に戻る）
//! - **peer_counter**: 相手から受理した最大のカウンタ。これ以下の値は再送攻撃として破棄
//!
//! ## 状態遷移
//!
//! ```text
//! new(boot_id) ──adopt(S1)──> S1 (counters = 0) ──adopt(S2)──> S2 (counters = 0)
//! ```
//!
//! カウンタをリセットするのは `adopt` だけ。

#![cfg_attr(not(test), no_std)]

pub mod session;

pub use session::{Session, SessionCheck};
