//! ノードのタイミング設定

use meshnet_transport::{NodeId, MASTER_ID};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 設定待ちタイムアウトの既定値（ミリ秒）
pub const DEFAULT_CONFIG_TIMEOUT_MS: u64 = 5_000;

/// ハートビート (`pong`) 間隔の既定値（ミリ秒）
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

/// レジストリの定期確認間隔の既定値（ミリ秒）
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 1_000;

/// 1 メッセージあたりの送信試行回数の既定値
pub const DEFAULT_SEND_ATTEMPTS: u8 = 3;

/// `booted` 送信失敗から再起動までの待機の既定値（ミリ秒）
pub const DEFAULT_RESTART_DELAY_MS: u64 = 1_000;

/// ノードの設定
///
/// 一部だけを指定した設定ドキュメントは残りを既定値で補う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// 設定待ち (AWAITING_CONFIG) の無通信タイムアウト
    pub config_timeout_ms: u64,
    /// `pong` を自発的に送る間隔
    pub heartbeat_interval_ms: u64,
    /// `Registry::check_items` を呼ぶ間隔
    pub check_interval_ms: u64,
    /// 送信試行回数（失敗ごとにリンクの生存確認を挟む）
    pub send_attempts: u8,
    /// `booted` 送信失敗時に再起動するまでの待機
    pub restart_delay_ms: u64,
    /// マスターのノード ID
    pub master_id: NodeId,
}

impl NodeConfig {
    /// 値の妥当性を検査する
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_attempts == 0 {
            return Err(ConfigError::ZeroSendAttempts);
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ZeroHeartbeatInterval);
        }
        if self.config_timeout_ms == 0 {
            return Err(ConfigError::ZeroConfigTimeout);
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            config_timeout_ms: DEFAULT_CONFIG_TIMEOUT_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            send_attempts: DEFAULT_SEND_ATTEMPTS,
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
            master_id: MASTER_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = NodeConfig::default();
        assert_eq!(config.send_attempts, 3);
        assert_eq!(config.master_id, MASTER_ID);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = NodeConfig { send_attempts: 0, ..NodeConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSendAttempts));

        let config = NodeConfig { heartbeat_interval_ms: 0, ..NodeConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroHeartbeatInterval));

        let config = NodeConfig { config_timeout_ms: 0, ..NodeConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroConfigTimeout));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NodeConfig =
            serde_json::from_str(r#"{ "heartbeat_interval_ms": 10000, "master_id": 2 }"#).unwrap();
        assert_eq!(config.heartbeat_interval_ms, 10_000);
        assert_eq!(config.master_id, 2);
        assert_eq!(config.config_timeout_ms, DEFAULT_CONFIG_TIMEOUT_MS);
        assert_eq!(config.send_attempts, DEFAULT_SEND_ATTEMPTS);
    }
}
