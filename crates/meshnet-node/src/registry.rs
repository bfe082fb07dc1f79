//! デバイス / アイテムレジストリとのインターフェース
//!
//! `configure` / `set_state` / `get_state` のペイロードの解釈はレジストリ側の責務。

use meshnet_proto::Message;

/// ペイロードを解釈する外部コラボレータ
pub trait Registry {
    /// `configure` メッセージを適用する
    fn configure(&mut self, message: &Message);

    /// `set_state` メッセージを適用する
    fn set_state(&mut self, message: &Message);

    /// `get_state` の要求を受け付ける（応答は `next_state` で送る）
    fn request_state(&mut self, message: &Message);

    /// 送信すべき状態があれば `outbound` のペイロードに書き込んで true を返す
    ///
    /// `outbound` は初期化済み。true のときノードが `reading` としてマスターに送信する。
    fn next_state(&mut self, outbound: &mut Message) -> bool;

    /// 定期的なアイテムの状態確認
    fn check_items(&mut self);
}
