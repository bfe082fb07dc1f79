//! 致命的な障害と設定エラー

use meshnet_transport::NodeId;
use thiserror::Error;

/// 再起動を引き起こす致命的な障害
///
/// どの障害でもセッションとカウンタを破棄してブートシーケンスをやり直す。
/// 部分的な回復は行わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// `booted` の送信が再試行を使い切っても届かなかった
    #[error("boot announcement could not be delivered")]
    AnnounceFailed,
    /// 設定待ちの間に一定時間メッセージが来なかった
    #[error("no configuration received for {elapsed_ms} ms")]
    ConfigTimeout {
        /// 最後の有効なメッセージからの経過時間
        elapsed_ms: u64,
    },
    /// マスターからの `reset` 指示
    #[error("reset requested by node {from:#04x}")]
    ResetRequested {
        /// 指示の送信元
        from: NodeId,
    },
}

/// `NodeConfig` の値が不正
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 送信試行回数が 0
    #[error("send_attempts must be at least 1")]
    ZeroSendAttempts,
    /// ハートビート間隔が 0
    #[error("heartbeat_interval_ms must be greater than zero")]
    ZeroHeartbeatInterval,
    /// 設定待ちタイムアウトが 0
    #[error("config_timeout_ms must be greater than zero")]
    ZeroConfigTimeout,
}
