//! # meshnet-crypto
//!
//! meshnet ノードのメッセージ認証プリミティブ。
//!
//! AES-128-OCB3 を平文なしで使い、認証タグだけを MAC として取り出す。
//! `no_std` かつヒープ確保なしで動作する。
//!
//! ## 認証タグの入力
//!
//! ```text
//! Nonce（12バイト）:
//!   [0x00][sender][receiver][type][session_id: u16 BE][counter: u16 BE][0x00 x4]
//!
//! 関連データ (AD):
//!   [payload...]
//!
//! タグ:
//!   OCB3 の 16 バイトタグの先頭 TAG_LEN (8) バイト
//! ```
//!
//! ルーティング情報（送信元・宛先・種別）はトランスポートのヘッダーで運ばれるが、
//! Nonce に含めることでペイロードと結び付けて認証される。

// テストでは proptest と format! のために std をリンクする
#![cfg_attr(not(test), no_std)]

mod error;
mod nonce;
mod tag;

pub use error::CryptoError;
pub use nonce::TagNonce;
pub use tag::{AuthTag, Authenticator, TagInput, TAG_LEN};

/// 事前共有鍵の長さ（バイト）
pub const KEY_LEN: usize = 16;

/// 事前共有鍵（AES-128）
///
/// プロビジョニング時に与えられ、プロセスの生存期間中は読み取り専用。
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// 16 バイトの raw 鍵から生成する
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Key(bytes)
    }

    /// 任意長のスライスから生成する（16 バイト以外はエラー）
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength)?;
        Ok(Key(key))
    }

    /// Base64 文字列（22文字）から生成する
    ///
    /// 鍵フォーマット: URL-safe, パディングなし（例: `AAECAwQFBgcICQoLDA0ODw`）
    pub fn from_base64(key_b64: &str) -> Result<Self, CryptoError> {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::{DecodeSliceError, Engine as _};

        // decode_slice は推定長（22文字 → 18バイト）分の領域を要求する
        let mut buf = [0u8; 24];
        let len = URL_SAFE_NO_PAD
            .decode_slice(key_b64, &mut buf)
            .map_err(|e| match e {
                DecodeSliceError::OutputSliceTooSmall => CryptoError::InvalidKeyLength,
                DecodeSliceError::DecodeError(_) => CryptoError::InvalidBase64,
            })?;

        Self::from_slice(&buf[..len])
    }

    /// 鍵バイト列への参照
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl core::fmt::Debug for Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // 鍵の中身はログに出さない
        f.write_str("Key(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_base64_valid() {
        // 0x00..0x0f の 16 バイト
        let key = Key::from_base64("AAECAwQFBgcICQoLDA0ODw").unwrap();
        let expected: [u8; 16] = core::array::from_fn(|i| i as u8);
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_key_from_base64_invalid_length() {
        let result = Key::from_base64("AAAAAAAAAAAAAA"); // 短すぎる
        assert_eq!(result, Err(CryptoError::InvalidKeyLength));

        // 長すぎる（24 バイト分）
        let result = Key::from_base64("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(result, Err(CryptoError::InvalidKeyLength));
    }

    #[test]
    fn test_key_from_base64_invalid_chars() {
        let result = Key::from_base64("!!!!AAAAAAAAAAAAAAAAAA");
        assert_eq!(result, Err(CryptoError::InvalidBase64));
    }

    #[test]
    fn test_key_from_slice() {
        assert!(Key::from_slice(&[0u8; 16]).is_ok());
        assert_eq!(Key::from_slice(&[0u8; 15]), Err(CryptoError::InvalidKeyLength));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let rendered = format!("{:?}", Key::new([0x42; 16]));
        assert_eq!(rendered, "Key(..)");
    }
}
