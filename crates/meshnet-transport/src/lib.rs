//! # meshnet-transport
//!
//! メッシュトランスポート層とのインターフェース。
//!
//! アドレス割り当て・マルチホップ経路制御・リンク層の再送・ウォッチドッグは
//! 外部のメッシュライブラリが担当する。このクレートはその境界だけを定義する。
//!
//! ## フレームヘッダー
//!
//! ```text
//! from: NodeId   送信元の論理ノード ID（トランスポートのアドレスではない）
//! to:   NodeId   宛先の論理ノード ID
//! type: u8       メッセージ種別タグ
//! ```
//!
//! ヘッダーの値はフレーム本体には重複して載らず、認証タグの入力として
//! 帯域外で `meshnet-proto` に渡される。

#![no_std]

pub mod header;

pub use header::{FrameHeader, NodeId, MASTER_ID};

/// メッシュトランスポートのアダプタ
///
/// 信頼性はない前提で扱う。`write` の失敗後は `check_liveness` / `renew` で
/// リンクを回復させてから再試行する。
pub trait Transport {
    /// トランスポートが保持している自ノード ID
    fn identity(&self) -> NodeId;

    /// 自ノード ID を書き込む（プロビジョニング）
    fn set_identity(&mut self, id: NodeId);

    /// リンクを立ち上げる（メッシュへの参加）
    fn bring_up(&mut self);

    /// 定期的なメッシュの保守処理（受信キューの処理など）
    fn update(&mut self);

    /// メッシュへの接続が生きているか確認する
    fn check_liveness(&mut self) -> bool;

    /// メッシュアドレスを更新する
    fn renew(&mut self);

    /// 受信可能なフレームがあるか（消費しない）
    fn poll(&mut self) -> bool;

    /// 先頭フレームのヘッダーを覗く（消費しない）
    fn peek(&mut self) -> Option<FrameHeader>;

    /// 先頭フレームを `buf` に読み込んで消費し、書き込んだバイト数を返す
    ///
    /// `buf` より長いフレームは切り詰められる。
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// フレームを送信する。トランスポート内部の再送を使い切っても届かなければ false
    fn write(&mut self, destination: NodeId, frame: &[u8], msg_type: u8) -> bool;
}
