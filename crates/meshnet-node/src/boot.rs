//! ブートハンドシェイク状態機械
//!
//! ## 状態遷移
//!
//! ```text
//! ┌───────────────┐ identity / bring up ┌─────────┐ booted sent ┌────────────────┐ configured ┌────────────┐
//! │ Uninitialized │────────────────────>│ Booting │────────────>│ AwaitingConfig │───────────>│ Configured │
//! └───────────────┘                     └─────────┘             └────────────────┘            └────────────┘
//!                                            │                    │  ↺ configure
//!                                            │ send failed        │ timeout
//!                                            ↓                    ↓
//!                                       Fault::AnnounceFailed   Fault::ConfigTimeout
//! ```
//!
//! 障害はすべて `Node::restart` → `Uninitialized` からのやり直しになる。

use log::{debug, info, warn};

use meshnet_proto::MessageType;
use meshnet_session::Session;
use meshnet_transport::Transport;

use crate::env::Environment;
use crate::error::Fault;
use crate::node::Node;
use crate::registry::Registry;

/// ブートハンドシェイクの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    /// 起動直後（リセット後）
    Uninitialized,
    /// ID 設定・リンク起動・セッション生成済み。`booted` 送信待ち
    Booting,
    /// `booted` 送信済み。マスターからの設定待ち
    AwaitingConfig {
        /// 無通信タイマーの起点
        last_activity_ms: u64,
    },
    /// ハンドシェイク完了。定常状態へ
    Configured,
}

impl<T, R, E> Node<T, R, E>
where
    T: Transport,
    R: Registry,
    E: Environment,
{
    /// ブート状態機械を 1 ステップ進め、遷移後の状態を返す
    ///
    /// `AwaitingConfig` では 1 回の呼び出しで受信フレームを高々 1 つ処理する。
    ///
    /// # エラー
    /// - `Fault::AnnounceFailed`: `booted` が届かなかった
    /// - `Fault::ConfigTimeout`: 設定待ちの無通信タイムアウト
    /// - `Fault::ResetRequested`: 正当な `reset` を受信した
    pub fn boot_step(&mut self) -> Result<BootState, Fault> {
        match self.state {
            BootState::Uninitialized => self.enter_booting(),
            BootState::Booting => self.announce()?,
            BootState::AwaitingConfig { last_activity_ms } => self.await_config(last_activity_ms)?,
            BootState::Configured => {}
        }
        Ok(self.state)
    }

    /// `Configured` に達するまで `boot_step` を繰り返す
    ///
    /// 設定待ちの間は定常状態の処理を一切行わない（タイムアウトで有界）。
    pub fn boot(&mut self) -> Result<(), Fault> {
        while self.boot_step()? != BootState::Configured {}
        Ok(())
    }

    /// ノード ID の照合、リンクの起動、起動セッションの生成
    fn enter_booting(&mut self) {
        if self.transport.identity() != self.node_id {
            info!("Set node id to: {:#04x}", self.node_id);
            self.transport.set_identity(self.node_id);
        } else {
            debug!("Node id already set");
        }

        self.transport.bring_up();
        self.transport.update();

        self.session = Session::new(self.fresh_session_id());
        info!("Boot session id is {}", self.session.id());
        self.state = BootState::Booting;
    }

    /// `booted` をマスターに送る
    fn announce(&mut self) -> Result<(), Fault> {
        debug!("Send booted packet");
        if !self.send_uptime(MessageType::Booted) {
            warn!("Send of booted failed");
            return Err(Fault::AnnounceFailed);
        }

        self.state = BootState::AwaitingConfig {
            last_activity_ms: self.env.now_ms(),
        };
        Ok(())
    }

    /// 設定待ちループの 1 反復
    ///
    /// タイマーを延長するのは受理した `configure` だけ。それ以外の受信では
    /// 同じ反復でタイムアウト判定まで進む。
    fn await_config(&mut self, last_activity_ms: u64) -> Result<(), Fault> {
        self.transport.update();

        if let Some(inbound) = self.fetch()? {
            match inbound.msg_type {
                Some(MessageType::Configure) => {
                    self.registry.configure(&self.rx);
                    self.send_pong();
                    self.state = BootState::AwaitingConfig {
                        last_activity_ms: self.env.now_ms(),
                    };
                    return Ok(());
                }
                Some(MessageType::Configured) => match self.rx.get_u16() {
                    Ok(session_id) => {
                        self.session.adopt(session_id);
                        self.send_pong();

                        let now = self.env.now_ms();
                        self.last_pong_ms = now;
                        self.last_check_ms = now;
                        self.state = BootState::Configured;
                        info!("Configured, session is {}", self.session.id());
                        return Ok(());
                    }
                    Err(e) => warn!("Malformed configured message: {}", e),
                },
                _ => self.log_unexpected(&inbound),
            }
        }

        let elapsed_ms = self.env.now_ms().saturating_sub(last_activity_ms);
        if elapsed_ms >= self.config.config_timeout_ms {
            return Err(Fault::ConfigTimeout { elapsed_ms });
        }
        Ok(())
    }
}
