//! 定常状態のイベントループ
//!
//! `process` は 1 回の呼び出しで次のうち高々 1 つを行う:
//!
//! 1. 受信コマンド (`set_state` / `get_state` / `ping`) の処理
//! 2. ハートビート `pong` の送信
//! 3. レジストリの状態報告
//! 4. レジストリの定期確認

use log::{debug, info, warn};

use meshnet_proto::MessageType;
use meshnet_transport::Transport;

use crate::env::Environment;
use crate::error::Fault;
use crate::node::Node;
use crate::registry::Registry;

/// `process` 1 回分の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 受信コマンドを処理した
    Handled(MessageType),
    /// ハートビート `pong` を送った
    Heartbeat,
    /// レジストリの状態を `reading` として送った
    StateSent,
    /// `check_items` を呼んだ
    Maintenance,
    /// 何もすることがなかった
    Idle,
    /// 未設定だったのでブートハンドシェイクを完了させた
    Booted,
    /// 障害から再起動してブートし直した
    Restarted,
}

impl<T, R, E> Node<T, R, E>
where
    T: Transport,
    R: Registry,
    E: Environment,
{
    /// 定常状態の処理を 1 単位だけ進める
    ///
    /// 未設定なら先にブートハンドシェイクを完了させる。
    ///
    /// # エラー
    /// - `Fault`: ブート中の障害、または正当な `reset` を受信した
    pub fn process(&mut self) -> Result<Step, Fault> {
        if !self.is_configured() {
            self.boot()?;
            return Ok(Step::Booted);
        }

        self.transport.update();

        if let Some(inbound) = self.fetch()? {
            match inbound.msg_type {
                Some(MessageType::SetState) => {
                    self.registry.set_state(&self.rx);
                    return Ok(Step::Handled(MessageType::SetState));
                }
                Some(MessageType::GetState) => {
                    self.registry.request_state(&self.rx);
                    return Ok(Step::Handled(MessageType::GetState));
                }
                Some(MessageType::Ping) => {
                    self.handle_ping();
                    return Ok(Step::Handled(MessageType::Ping));
                }
                _ => self.log_unexpected(&inbound),
            }
        }

        let now = self.env.now_ms();

        if now.saturating_sub(self.last_pong_ms) >= self.config.heartbeat_interval_ms {
            debug!("Heartbeat");
            self.send_pong();
            self.last_pong_ms = now;
            return Ok(Step::Heartbeat);
        }

        self.tx.init(self.session.id(), self.session.own_counter());
        if self.registry.next_state(&mut self.tx) {
            if !self.send(self.config.master_id, MessageType::Reading) {
                warn!("Cannot deliver state reading");
            }
            return Ok(Step::StateSent);
        }

        if now.saturating_sub(self.last_check_ms) >= self.config.check_interval_ms {
            self.registry.check_items();
            self.last_check_ms = now;
            return Ok(Step::Maintenance);
        }

        Ok(Step::Idle)
    }

    /// `process` を 1 回実行し、障害なら再起動してブートし直す
    ///
    /// 呼び出し側のメインループはこれを繰り返すだけでよい。
    pub fn run_once(&mut self) -> Step {
        match self.process() {
            Ok(step) => step,
            Err(fault) => {
                self.restart(fault);
                self.start();
                Step::Restarted
            }
        }
    }

    /// `ping` のペイロードにあるセッション ID が現在と違えば採用する
    fn handle_ping(&mut self) {
        match self.rx.get_u16() {
            Ok(session_id) if session_id != self.session.id() => {
                info!("Renegotiate session on ping");
                self.session.adopt(session_id);
                self.send_pong();
                self.last_pong_ms = self.env.now_ms();
                self.log_session();
            }
            Ok(_) => debug!("Ping in current session"),
            Err(e) => warn!("Malformed ping message: {}", e),
        }
    }
}
