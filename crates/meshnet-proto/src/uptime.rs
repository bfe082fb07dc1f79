//! `booted` / `pong` が運ぶアップタイム
//!
//! 送信側の起動後経過ミリ秒の下位 16 ビット。約 65.5 秒で一周するので、
//! 受信側は同じノードから届いた 2 つの値の差だけを使う。

use crate::error::ProtoError;
use crate::message::Message;

/// 起動後経過時間（ミリ秒、mod 2^16）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime16(u16);

impl Uptime16 {
    /// ミリ秒のクロック値から作る
    pub const fn from_millis(ms: u64) -> Self {
        Uptime16(ms as u16)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// `earlier` からの経過ミリ秒。一周をまたいでも正しい（1 周以内なら）
    pub fn elapsed_since(self, earlier: Uptime16) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }

    /// ペイロードに書き込む
    pub fn write_to(self, msg: &mut Message) -> Result<(), ProtoError> {
        msg.put_u16(self.0)
    }

    /// ペイロードから読み出す
    pub fn read_from(msg: &mut Message) -> Result<Self, ProtoError> {
        msg.get_u16().map(Uptime16)
    }
}
