//! meshnet-proto エラー型

use meshnet_crypto::CryptoError;
use thiserror::Error;

/// フレームの組み立て・検証のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// ペイロードの書き込みが容量を超える
    #[error("payload overflow (max {max} bytes)", max = crate::MAX_PAYLOAD_LEN)]
    PayloadOverflow,
    /// ペイロードの読み出しが末尾を超える
    #[error("payload truncated")]
    Truncated,
    /// 受信フレームがヘッダー + タグより短い
    #[error("frame too short: {0} bytes")]
    FrameTooShort(usize),
    /// 受信フレームが最大フレーム長を超える
    #[error("frame too long: {0} bytes (max {max})", max = crate::MAX_FRAME_LEN)]
    FrameTooLong(usize),
    /// 認証タグの不一致
    #[error("authentication tag mismatch")]
    TagMismatch,
    /// 未知のメッセージ種別タグ
    #[error("unknown message type: {0:#04x}")]
    UnknownType(u8),
    /// 認証プリミティブのエラー
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
