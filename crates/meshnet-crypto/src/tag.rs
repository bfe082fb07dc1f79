//! AES-128-OCB3 による認証タグの計算と検証
//!
//! OCB3 を空の平文で呼び出し、ペイロードを関連データとして渡すことで
//! 得られるタグを MAC として使う。暗号化は行わない。

use aead::{AeadInPlace, KeyInit};
use aes::Aes128;
use ocb3::Ocb3;

use crate::error::CryptoError;
use crate::nonce::TagNonce;
use crate::Key;

/// AES-128-OCB3 (12バイト nonce, 16バイト tag) の型エイリアス
type Aes128Ocb3 = Ocb3<Aes128>;

/// ワイヤー上の認証タグ長（OCB3 タグの先頭 8 バイト）
pub const TAG_LEN: usize = 8;

/// 切り詰め済み認証タグ
pub type AuthTag = [u8; TAG_LEN];

/// タグの入力となるルーティング情報とセッション情報
///
/// sender / receiver / msg_type はトランスポート層から帯域外で渡される値。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInput {
    /// 送信元ノード ID
    pub sender: u8,
    /// 宛先ノード ID
    pub receiver: u8,
    /// メッセージ種別タグ
    pub msg_type: u8,
    /// フレームに刻まれたセッション ID
    pub session_id: u16,
    /// フレームに刻まれたカウンタ
    pub counter: u16,
}

/// 事前共有鍵から展開した認証器
///
/// 鍵スケジュールを一度だけ展開し、以降は読み取り専用で共有する。
pub struct Authenticator {
    cipher: Aes128Ocb3,
}

impl Authenticator {
    /// 事前共有鍵から認証器を生成する
    pub fn new(key: &Key) -> Self {
        Authenticator {
            cipher: Aes128Ocb3::new(key.as_bytes().into()),
        }
    }

    /// 認証タグを計算する
    ///
    /// # エラー
    /// - `CryptoError::TagComputation`: OCB3 の入力長上限を超えた（フレーム長では起こらない）
    pub fn compute(&self, input: &TagInput, payload: &[u8]) -> Result<AuthTag, CryptoError> {
        let nonce = TagNonce::new(input);
        let full = self
            .cipher
            .encrypt_in_place_detached(nonce.as_bytes().into(), payload, &mut [])
            .map_err(|_| CryptoError::TagComputation)?;

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&full[..TAG_LEN]);
        Ok(tag)
    }

    /// 受信したタグを検証する
    ///
    /// 比較は全バイトを畳み込んでから判定する（途中で打ち切らない）。
    pub fn verify(&self, input: &TagInput, payload: &[u8], received: &[u8]) -> bool {
        if received.len() != TAG_LEN {
            return false;
        }
        let Ok(expected) = self.compute(input, payload) else {
            return false;
        };

        let diff = expected
            .iter()
            .zip(received)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_auth() -> Authenticator {
        Authenticator::new(&Key::new(core::array::from_fn(|i| i as u8)))
    }

    fn input() -> TagInput {
        TagInput {
            sender: 1,
            receiver: 0,
            msg_type: 5,
            session_id: 0x1234,
            counter: 7,
        }
    }

    #[test]
    fn test_tag_is_deterministic() {
        let auth = make_auth();
        let a = auth.compute(&input(), b"hello").unwrap();
        let b = auth.compute(&input(), b"hello").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_accepts_own_tag() {
        let auth = make_auth();
        let tag = auth.compute(&input(), b"state").unwrap();
        assert!(auth.verify(&input(), b"state", &tag));
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let tag = make_auth().compute(&input(), b"secret").unwrap();

        let other = Authenticator::new(&Key::new([0xFF; 16]));
        assert!(!other.verify(&input(), b"secret", &tag));
    }

    #[test]
    fn test_verify_rejects_wrong_tag_length() {
        let auth = make_auth();
        let tag = auth.compute(&input(), b"").unwrap();
        assert!(!auth.verify(&input(), b"", &tag[..TAG_LEN - 1]));
    }

    #[test]
    fn test_empty_payload_has_tag() {
        let auth = make_auth();
        let tag = auth.compute(&input(), b"").unwrap();
        assert!(auth.verify(&input(), b"", &tag));
        assert!(!auth.verify(&input(), b"\0", &tag));
    }

    proptest! {
        /// 送信元・宛先・種別のどの 1 ビット反転でも検証に失敗する
        #[test]
        fn prop_routing_bit_flip_fails(bit in 0usize..24, payload in proptest::collection::vec(any::<u8>(), 0..20)) {
            let auth = make_auth();
            let tag = auth.compute(&input(), &payload).unwrap();

            let mut tampered = input();
            match bit / 8 {
                0 => tampered.sender ^= 1 << (bit % 8),
                1 => tampered.receiver ^= 1 << (bit % 8),
                _ => tampered.msg_type ^= 1 << (bit % 8),
            }
            prop_assert!(!auth.verify(&tampered, &payload, &tag));
        }

        /// ペイロードのどの 1 ビット反転でも検証に失敗する
        #[test]
        fn prop_payload_bit_flip_fails(payload in proptest::collection::vec(any::<u8>(), 1..20), idx in any::<prop::sample::Index>(), bit in 0u8..8) {
            let auth = make_auth();
            let tag = auth.compute(&input(), &payload).unwrap();

            let mut tampered = payload.clone();
            let i = idx.index(tampered.len());
            tampered[i] ^= 1 << bit;
            prop_assert!(!auth.verify(&input(), &tampered, &tag));
        }
    }
}
