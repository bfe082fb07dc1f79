//! セッション ID と方向ごとの単調カウンタ

use log::{debug, warn};

/// 受信フレームのセッション ID 判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// 現在のセッションと一致（受理）
    Accept,
    /// 現在のセッションと不一致
    ///
    /// 採用するかどうかはメッセージ種別ごとに呼び出し側が決める。
    Mismatch {
        /// 現在のセッション ID
        current: u16,
        /// フレームに刻まれていたセッション ID
        received: u16,
    },
}

/// セッション状態
///
/// 送信カウンタと受信カウンタは独立しており、`adopt` でのみ同時に 0 に戻る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 現在のセッション ID
    id: u16,
    /// 次に送信するメッセージのカウンタ
    own_counter: u16,
    /// 相手から受理した最大のカウンタ
    peer_counter: u16,
}

impl Session {
    /// 新しいセッションを生成する（カウンタは 0）
    pub const fn new(id: u16) -> Self {
        Session {
            id,
            own_counter: 0,
            peer_counter: 0,
        }
    }

    /// 現在のセッション ID
    pub fn id(&self) -> u16 {
        self.id
    }

    /// 次の送信で使われるカウンタ（消費しない）
    pub fn own_counter(&self) -> u16 {
        self.own_counter
    }

    /// 相手から受理した最大のカウンタ
    pub fn peer_counter(&self) -> u16 {
        self.peer_counter
    }

    /// 受信フレームのセッション ID を判定する
    pub fn accept_incoming(&self, session_id: u16) -> SessionCheck {
        if session_id == self.id {
            SessionCheck::Accept
        } else {
            SessionCheck::Mismatch {
                current: self.id,
                received: session_id,
            }
        }
    }

    /// 受信カウンタを検査する
    ///
    /// `counter > peer_counter` のときだけ受理して peer_counter を更新する。
    /// 欠番は許容し、後退と重複は拒否する。
    pub fn accept_counter(&mut self, counter: u16) -> bool {
        if counter <= self.peer_counter {
            debug!("Stale counter {} (last accepted {})", counter, self.peer_counter);
            return false;
        }
        self.peer_counter = counter;
        true
    }

    /// 送信カウンタを返して 1 進める
    pub fn next_outgoing_counter(&mut self) -> u16 {
        let counter = self.own_counter;
        self.own_counter = self.own_counter.wrapping_add(1);
        if self.own_counter == 0 {
            // 以降の送信は相手に再送扱いされる。相手側の ping による再ネゴシエーション待ち
            warn!("Outgoing counter wrapped in session {}", self.id);
        }
        counter
    }

    /// 新しいセッション ID を採用し、両方向のカウンタを 0 に戻す
    pub fn adopt(&mut self, id: u16) {
        debug!("Adopt session {} (was {})", id, self.id);
        self.id = id;
        self.own_counter = 0;
        self.peer_counter = 0;
    }
}
