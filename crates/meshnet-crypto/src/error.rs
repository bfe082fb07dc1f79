//! 認証プリミティブのエラー型

use thiserror::Error;

/// 鍵の読み込み・タグ計算のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// 鍵の長さが不正（16バイト以外）
    #[error("invalid key length (expected 16 bytes)")]
    InvalidKeyLength,
    /// Base64 デコードに失敗
    #[error("invalid base64 encoding")]
    InvalidBase64,
    /// OCB3 がタグ計算を拒否した（入力長が上限超過）
    #[error("authentication tag computation failed")]
    TagComputation,
}
