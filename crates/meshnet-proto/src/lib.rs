//! # meshnet-proto
//!
//! meshnet ノードとマスター間のフレーム形式と、メッセージ種別の定義。
//!
//! ## Wire Format
//!
//! ```text
//! [session_id: u16 BE][counter: u16 BE][payload: 0..=20 bytes][auth_tag: 8 bytes]
//! ```
//!
//! 送信元・宛先・種別タグはトランスポート層のヘッダーで運ばれ、フレーム本体には
//! 含まれない。ただし認証タグの入力には含まれる（`meshnet-crypto` 参照）。
//!
//! ## ペイロード
//!
//! | 種別 | 方向 | ペイロード |
//! |---|---|---|
//! | `booted` | node → master | アップタイム (u16) |
//! | `configure` | master → node | レジストリ設定（不透明） |
//! | `configured` | master → node | 新しいセッション ID (u16) |
//! | `ping` | master → node | 候補セッション ID (u16) |
//! | `pong` | node → master | アップタイム (u16) |
//! | `reset` | master → node | なし |
//! | `set_state` / `get_state` / `reading` | 双方向 | レジストリ定義（不透明） |

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod message;
pub mod uptime;

pub use error::ProtoError;
pub use message::Message;
pub use uptime::Uptime16;

pub use meshnet_crypto::TAG_LEN;

/// 最大フレーム長（無線 1 パケットのペイロード長）
pub const MAX_FRAME_LEN: usize = 32;

/// フレームヘッダー長（session_id: 2 + counter: 2）
pub const HEADER_LEN: usize = 4;

/// ペイロードの最大長
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - HEADER_LEN - TAG_LEN;

/// メッセージ種別タグ
///
/// トランスポート層ヘッダーの type フィールドに載る値。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// 起動直後の初回通知（アップタイムを運ぶ）
    Booted = 1,
    /// 設定ペイロード（セッション確立前）
    Configure = 2,
    /// ハンドシェイク完了（新しいセッション ID を運ぶ）
    Configured = 3,
    /// 生存確認（候補セッション ID を運ぶ）
    Ping = 4,
    /// ハートビート
    Pong = 5,
    /// 無条件再起動の指示
    Reset = 6,
    /// レジストリへの状態設定
    SetState = 7,
    /// レジストリへの状態要求
    GetState = 8,
    /// レジストリからの状態通知
    Reading = 9,
}

impl MessageType {
    /// ワイヤー上のタグ値
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// タグ値から種別を復元する（未知のタグは `None`）
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => MessageType::Booted,
            2 => MessageType::Configure,
            3 => MessageType::Configured,
            4 => MessageType::Ping,
            5 => MessageType::Pong,
            6 => MessageType::Reset,
            7 => MessageType::SetState,
            8 => MessageType::GetState,
            9 => MessageType::Reading,
            _ => return None,
        })
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtoError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        MessageType::from_tag(tag).ok_or(ProtoError::UnknownType(tag))
    }
}

impl From<MessageType> for u8 {
    fn from(msg_type: MessageType) -> u8 {
        msg_type.tag()
    }
}
