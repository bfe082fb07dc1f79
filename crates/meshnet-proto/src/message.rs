//! 固定長メッセージバッファ
//!
//! ノードは送信用と受信用に `Message` を 1 つずつ保持し、毎回 `init` / `reset` で
//! 完全に初期化して再利用する。ヒープ確保は行わない。
//!
//! ## 送信
//! ```text
//! init(session, counter) → put_u16 / put_bytes ... → finalize(auth, from, to, type)
//! ```
//!
//! ## 受信
//! ```text
//! reset() → raw_buffer_mut() にトランスポートから読み込み → authenticate(...) → get_u16 ...
//! ```

use meshnet_crypto::{Authenticator, TagInput, TAG_LEN};

use crate::error::ProtoError;
use crate::{HEADER_LEN, MAX_FRAME_LEN, MAX_PAYLOAD_LEN};

/// ヘッダー + ペイロードの最大長（タグを除く）
const MAX_BODY_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// 1 フレーム分の固定長スクラッチバッファ
#[derive(Clone)]
pub struct Message {
    buf: [u8; MAX_FRAME_LEN],
    /// ヘッダー + ペイロードの有効長（タグを含まない）
    len: usize,
    /// 読み出しカーソル
    cursor: usize,
    /// finalize 済み / 検証済みフレームの全長（タグ込み）。それ以外は 0
    frame_len: usize,
}

impl Message {
    /// 空のメッセージを生成する
    pub const fn new() -> Self {
        Message {
            buf: [0u8; MAX_FRAME_LEN],
            len: 0,
            cursor: 0,
            frame_len: 0,
        }
    }

    /// 受信バッファとして読み込める最大バイト数
    pub const fn max_len() -> usize {
        MAX_FRAME_LEN
    }

    /// 受信用に全フィールドをクリアする
    pub fn reset(&mut self) {
        self.buf = [0u8; MAX_FRAME_LEN];
        self.len = 0;
        self.cursor = 0;
        self.frame_len = 0;
    }

    /// 送信用に初期化し、セッション ID とカウンタを刻む
    ///
    /// ペイロードは空になり、以降 `put_*` で追記する。
    pub fn init(&mut self, session_id: u16, counter: u16) {
        self.reset();
        self.write_header(session_id, counter);
        self.len = HEADER_LEN;
        self.cursor = HEADER_LEN;
    }

    /// ペイロードを保ったままヘッダーを書き換える
    ///
    /// 既存の finalize 結果は無効になる。
    pub fn stamp(&mut self, session_id: u16, counter: u16) {
        if self.len < HEADER_LEN {
            self.len = HEADER_LEN;
        }
        self.write_header(session_id, counter);
        self.frame_len = 0;
    }

    fn write_header(&mut self, session_id: u16, counter: u16) {
        self.buf[0..2].copy_from_slice(&session_id.to_be_bytes());
        self.buf[2..4].copy_from_slice(&counter.to_be_bytes());
    }

    // ===== ペイロードの書き込み =====

    /// 1 バイト追記する
    pub fn put_u8(&mut self, value: u8) -> Result<(), ProtoError> {
        self.put_bytes(&[value])
    }

    /// u16 (big-endian) を追記する
    pub fn put_u16(&mut self, value: u16) -> Result<(), ProtoError> {
        self.put_bytes(&value.to_be_bytes())
    }

    /// バイト列を追記する。容量を超える場合は何も書かずにエラーを返す
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), ProtoError> {
        let start = self.len.max(HEADER_LEN);
        let end = start + bytes.len();
        if end > MAX_BODY_LEN {
            return Err(ProtoError::PayloadOverflow);
        }
        self.buf[start..end].copy_from_slice(bytes);
        self.len = end;
        self.frame_len = 0;
        Ok(())
    }

    // ===== ペイロードの読み出し =====

    /// 1 バイト読み出す
    pub fn get_u8(&mut self) -> Result<u8, ProtoError> {
        let [value] = self.take::<1>()?;
        Ok(value)
    }

    /// u16 (big-endian) を読み出す
    pub fn get_u16(&mut self) -> Result<u16, ProtoError> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtoError> {
        let start = self.cursor.max(HEADER_LEN);
        let end = start + N;
        if end > self.len {
            return Err(ProtoError::Truncated);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[start..end]);
        self.cursor = end;
        Ok(out)
    }

    /// まだ読み出していないペイロード
    pub fn remaining(&self) -> &[u8] {
        let start = self.cursor.clamp(HEADER_LEN, self.len.max(HEADER_LEN));
        &self.buf[start..self.len.max(HEADER_LEN)]
    }

    // ===== フィールドアクセサ =====

    /// ヘッダーのセッション ID
    pub fn session_id(&self) -> u16 {
        u16::from_be_bytes([self.buf[0], self.buf[1]])
    }

    /// ヘッダーのカウンタ
    pub fn counter(&self) -> u16 {
        u16::from_be_bytes([self.buf[2], self.buf[3]])
    }

    /// ペイロード全体
    pub fn payload(&self) -> &[u8] {
        &self.buf[HEADER_LEN..self.len.max(HEADER_LEN)]
    }

    /// finalize 済み / 検証済みのフレーム（それ以外は空）
    pub fn frame(&self) -> &[u8] {
        &self.buf[..self.frame_len]
    }

    /// トランスポートからの読み込み先
    pub fn raw_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    // ===== 認証 =====

    /// 認証タグを計算してフレームを完成させる
    ///
    /// 戻り値はそのままトランスポートに渡せるフレーム。
    pub fn finalize(
        &mut self,
        auth: &Authenticator,
        sender: u8,
        receiver: u8,
        msg_type: u8,
    ) -> Result<&[u8], ProtoError> {
        let body_len = self.len.max(HEADER_LEN);
        let input = self.tag_input(sender, receiver, msg_type);
        let tag = auth.compute(&input, &self.buf[HEADER_LEN..body_len])?;

        self.buf[body_len..body_len + TAG_LEN].copy_from_slice(&tag);
        self.len = body_len;
        self.frame_len = body_len + TAG_LEN;
        Ok(self.frame())
    }

    /// 受信フレームを検証する
    ///
    /// sender / receiver / msg_type はトランスポート層から帯域外で渡された値を使う。
    /// 成功すると読み出しカーソルがペイロード先頭に置かれる。失敗時はペイロードを
    /// 読めない状態に戻す。
    pub fn authenticate(
        &mut self,
        auth: &Authenticator,
        sender: u8,
        receiver: u8,
        msg_type: u8,
        received_len: usize,
    ) -> Result<(), ProtoError> {
        self.len = 0;
        self.cursor = 0;
        self.frame_len = 0;

        if received_len < HEADER_LEN + TAG_LEN {
            return Err(ProtoError::FrameTooShort(received_len));
        }
        if received_len > MAX_FRAME_LEN {
            return Err(ProtoError::FrameTooLong(received_len));
        }

        let body_len = received_len - TAG_LEN;
        let input = self.tag_input(sender, receiver, msg_type);
        let payload = &self.buf[HEADER_LEN..body_len];
        let tag = &self.buf[body_len..received_len];
        if !auth.verify(&input, payload, tag) {
            return Err(ProtoError::TagMismatch);
        }

        self.len = body_len;
        self.cursor = HEADER_LEN;
        self.frame_len = received_len;
        Ok(())
    }

    /// `authenticate` の真偽値版
    pub fn verify(
        &mut self,
        auth: &Authenticator,
        sender: u8,
        receiver: u8,
        msg_type: u8,
        received_len: usize,
    ) -> bool {
        self.authenticate(auth, sender, receiver, msg_type, received_len)
            .is_ok()
    }

    fn tag_input(&self, sender: u8, receiver: u8, msg_type: u8) -> TagInput {
        TagInput {
            sender,
            receiver,
            msg_type,
            session_id: self.session_id(),
            counter: self.counter(),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Message {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Message")
            .field("session_id", &self.session_id())
            .field("counter", &self.counter())
            .field("payload", &self.payload())
            .field("frame_len", &self.frame_len)
            .finish()
    }
}
