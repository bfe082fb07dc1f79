//! プロトコルエンジン本体
//!
//! 認証・セッション管理・送受信経路を統合する。ブートハンドシェイクは
//! `boot.rs`、定常状態の処理は `steady.rs` にある。

use log::{debug, info, warn};

use meshnet_crypto::{Authenticator, Key};
use meshnet_proto::{Message, MessageType, Uptime16};
use meshnet_session::{Session, SessionCheck};
use meshnet_transport::{NodeId, Transport};

use crate::boot::BootState;
use crate::config::NodeConfig;
use crate::env::Environment;
use crate::error::{ConfigError, Fault};
use crate::registry::Registry;

/// 認証・鮮度検査を通過した受信メッセージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Inbound {
    /// 送信元ノード ID
    pub from: NodeId,
    /// ヘッダーの種別タグ（未知の値を含む）
    pub tag: u8,
    /// 既知の種別なら `Some`
    pub msg_type: Option<MessageType>,
}

/// meshnet ノード
///
/// ## 内部アーキテクチャ
///
/// ```text
/// Node
///   ├── Authenticator (meshnet-crypto)    - 事前共有鍵による認証タグ
///   ├── Message x2    (meshnet-proto)     - 送信用 / 受信用スクラッチバッファ
///   ├── Session       (meshnet-session)   - セッション ID と再送防止カウンタ
///   ├── T: Transport  (meshnet-transport) - メッシュリンク
///   ├── R: Registry                       - ペイロードの解釈
///   └── E: Environment                    - 時刻と待機
/// ```
///
/// ## 実行モデル
///
/// シングルスレッド・協調的。`process` は 1 回の呼び出しで高々 1 単位の仕事をして
/// 戻る。再入はないため、2 つのメッセージバッファが同時に使われることはない。
pub struct Node<T, R, E> {
    /// 自ノード ID（プロビジョニング時に決まる）
    pub(crate) node_id: NodeId,
    /// 事前共有鍵から展開した認証器
    pub(crate) auth: Authenticator,
    pub(crate) config: NodeConfig,
    pub(crate) transport: T,
    pub(crate) registry: R,
    pub(crate) env: E,
    pub(crate) session: Session,
    pub(crate) state: BootState,
    /// 送信用スクラッチ
    pub(crate) tx: Message,
    /// 受信用スクラッチ
    pub(crate) rx: Message,
    /// 最後に `pong` を送った時刻
    pub(crate) last_pong_ms: u64,
    /// 最後に `check_items` を呼んだ時刻
    pub(crate) last_check_ms: u64,
}

impl<T, R, E> Node<T, R, E>
where
    T: Transport,
    R: Registry,
    E: Environment,
{
    /// ノードを生成する
    ///
    /// この時点では何も送信しない。`start` でブートシーケンスを開始する。
    ///
    /// # エラー
    /// - `ConfigError`: 設定値が不正
    pub fn new(
        node_id: NodeId,
        key: &Key,
        config: NodeConfig,
        transport: T,
        registry: R,
        env: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Node {
            node_id,
            auth: Authenticator::new(key),
            config,
            transport,
            registry,
            env,
            session: Session::new(0),
            state: BootState::Uninitialized,
            tx: Message::new(),
            rx: Message::new(),
            last_pong_ms: 0,
            last_check_ms: 0,
        })
    }

    // ===== 送信経路 =====

    /// 送信用スクラッチを初期化して返す
    ///
    /// カウンタは `send` で確定するので、ここでは消費しない。
    pub fn prepare_send(&mut self) -> &mut Message {
        self.tx.init(self.session.id(), self.session.own_counter());
        &mut self.tx
    }

    /// 送信用スクラッチの内容を送る
    ///
    /// カウンタを刻んで認証タグを付け、最大 `send_attempts` 回書き込む。
    /// 失敗のたびにリンクの生存確認（必要ならアドレス更新）を挟む。
    /// false は「今回の通信は失敗した」ことを表し、致命的ではない。
    pub fn send(&mut self, destination: NodeId, msg_type: MessageType) -> bool {
        let counter = self.session.next_outgoing_counter();
        self.tx.stamp(self.session.id(), counter);

        let frame = match self
            .tx
            .finalize(&self.auth, self.node_id, destination, msg_type.tag())
        {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Cannot finalize {:?} message: {}", msg_type, e);
                return false;
            }
        };

        for attempt in 1..=self.config.send_attempts {
            if self.transport.write(destination, frame, msg_type.tag()) {
                return true;
            }
            debug!("Write of {:?} failed (attempt {})", msg_type, attempt);
            if !self.transport.check_liveness() {
                // メッシュアドレスを取り直す
                self.transport.renew();
            }
        }

        warn!(
            "Send of {:?} to {:#04x} failed after {} attempts",
            msg_type, destination, self.config.send_attempts
        );
        false
    }

    /// アップタイムを載せたメッセージをマスターに送る（`booted` / `pong`）
    pub(crate) fn send_uptime(&mut self, msg_type: MessageType) -> bool {
        let uptime = Uptime16::from_millis(self.env.now_ms());
        if let Err(e) = uptime.write_to(self.prepare_send()) {
            warn!("Cannot build {:?} message: {}", msg_type, e);
            return false;
        }
        self.send(self.config.master_id, msg_type)
    }

    /// `pong` を送る
    pub(crate) fn send_pong(&mut self) -> bool {
        self.send_uptime(MessageType::Pong)
    }

    // ===== 受信経路 =====

    /// 受信フレームを 1 つ取り出して検証する
    ///
    /// 検証順: 宛先 → 認証タグ → セッション → (`reset` なら再起動) → カウンタ。
    /// 認証・鮮度検査に落ちたフレームは黙って破棄して `Ok(None)` を返す。
    ///
    /// # エラー
    /// - `Fault::ResetRequested`: 正当な `reset` を受信した
    pub(crate) fn fetch(&mut self) -> Result<Option<Inbound>, Fault> {
        if !self.transport.poll() {
            return Ok(None);
        }
        let Some(header) = self.transport.peek() else {
            return Ok(None);
        };
        debug!("Packet available");

        self.rx.reset();
        let size = self.transport.read(self.rx.raw_buffer_mut());
        debug!(
            "Got packet from {:#04x} to {:#04x} ({} bytes)",
            header.from, header.to, size
        );

        if header.to != self.node_id {
            debug!("Packet not addressed to us");
            return Ok(None);
        }

        if let Err(e) = self
            .rx
            .authenticate(&self.auth, header.from, header.to, header.msg_type, size)
        {
            debug!("Cannot verify message: {}", e);
            return Ok(None);
        }

        let msg_type = MessageType::from_tag(header.msg_type);

        match self.session.accept_incoming(self.rx.session_id()) {
            SessionCheck::Accept => {}
            SessionCheck::Mismatch { current, received } if self.is_advisory(msg_type) => {
                // 既知の信頼境界: 設定待ちの configure はセッションを参考値として扱う
                warn!(
                    "Accepting configure with session {} while awaiting config (current {})",
                    received, current
                );
            }
            SessionCheck::Mismatch { current, received } => {
                debug!("Wrong session: {} != {}", received, current);
                return Ok(None);
            }
        }

        // 送信側が再起動してカウンタを失っている可能性があるので、
        // reset はカウンタ検査の前に処理する
        if msg_type == Some(MessageType::Reset) {
            warn!("Reset requested by {:#04x}", header.from);
            return Err(Fault::ResetRequested { from: header.from });
        }

        if !self.session.accept_counter(self.rx.counter()) {
            debug!("Wrong counter: {}", self.rx.counter());
            return Ok(None);
        }

        Ok(Some(Inbound {
            from: header.from,
            tag: header.msg_type,
            msg_type,
        }))
    }

    /// セッション不一致でも受け付ける例外か
    fn is_advisory(&self, msg_type: Option<MessageType>) -> bool {
        matches!(self.state, BootState::AwaitingConfig { .. })
            && msg_type == Some(MessageType::Configure)
    }

    // ===== 再起動 =====

    /// 致命的な障害からの再起動
    ///
    /// セッション・カウンタ・バッファ・タイマーをすべて破棄し、状態を
    /// `Uninitialized` に戻す。続けて `start` を呼ぶとブートシーケンスが
    /// 最初から実行される。
    pub fn restart(&mut self, fault: Fault) {
        warn!("Reset controller: {}", fault);
        if fault == Fault::AnnounceFailed {
            self.env.delay_ms(self.config.restart_delay_ms);
        }

        self.state = BootState::Uninitialized;
        self.session = Session::new(0);
        self.tx.reset();
        self.rx.reset();
        self.last_pong_ms = 0;
        self.last_check_ms = 0;
    }

    /// ブートハンドシェイクを完了するまで実行する
    ///
    /// 障害のたびに `restart` してやり直す。戻った時点で必ず `Configured`。
    pub fn start(&mut self) {
        loop {
            match self.boot() {
                Ok(()) => return,
                Err(fault) => self.restart(fault),
            }
        }
    }

    // ===== アクセサ =====

    /// 自ノード ID
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// 現在のブート状態
    pub fn boot_state(&self) -> BootState {
        self.state
    }

    /// 現在のセッション
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 設定
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// トランスポート
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// トランスポート（可変）
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// レジストリ
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// レジストリ（可変）
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// 環境
    pub fn env(&self) -> &E {
        &self.env
    }

    /// 環境（可変）
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// 起動用のセッション ID をフリーランニングクロックから作る
    pub(crate) fn fresh_session_id(&self) -> u16 {
        (self.env.now_us() & 0xFFFF) as u16
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.state == BootState::Configured
    }

    pub(crate) fn log_unexpected(&self, inbound: &Inbound) {
        warn!(
            "Got an unexpected message from {:#04x} with type {:#04x}",
            inbound.from, inbound.tag
        );
    }

    pub(crate) fn log_session(&self) {
        info!("Session is {}", self.session.id());
    }
}
