//! 認証タグ用 Nonce
//!
//! ## Nonce 構造（12バイト）
//! ```text
//! bytes[0]      = 0x00  (予約)
//! bytes[1]      = sender
//! bytes[2]      = receiver
//! bytes[3]      = type
//! bytes[4..6]   = session_id, big-endian
//! bytes[6..8]   = counter, big-endian
//! bytes[8..12]  = 0x00000000  (ゼロパディング)
//! ```
//!
//! 同一セッション内では counter が単調増加するため、方向（sender/receiver）ごとに
//! Nonce が重複しない。

use crate::tag::TagInput;

/// 認証タグ計算に使う OCB3 Nonce（12バイト）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagNonce([u8; 12]);

impl TagNonce {
    /// ルーティング情報とセッション情報から Nonce を構築する
    pub fn new(input: &TagInput) -> Self {
        let mut bytes = [0u8; 12];
        bytes[1] = input.sender;
        bytes[2] = input.receiver;
        bytes[3] = input.msg_type;
        bytes[4..6].copy_from_slice(&input.session_id.to_be_bytes());
        bytes[6..8].copy_from_slice(&input.counter.to_be_bytes());
        // bytes[8..12] はゼロのまま
        TagNonce(bytes)
    }

    /// 12 バイトの nonce データへの参照を返す
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}
