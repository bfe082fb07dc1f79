//! 受け取ったものを記録するだけのレジストリ

use std::collections::VecDeque;

use log::warn;

use meshnet_node::{Message, Registry};

/// 呼び出しを記録するレジストリ
///
/// `get_state` を受けると、最後に `set_state` で受け取ったペイロードを
/// 次の `reading` として返す。
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    pub configured: Vec<Vec<u8>>,
    pub set_states: Vec<Vec<u8>>,
    pub state_requests: Vec<Vec<u8>>,
    /// 送信待ちの `reading` ペイロード
    pub pending: VecDeque<Vec<u8>>,
    pub checks: usize,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次の `process` で送る `reading` を積む
    pub fn queue_reading(&mut self, payload: &[u8]) {
        self.pending.push_back(payload.to_vec());
    }
}

impl Registry for RecordingRegistry {
    fn configure(&mut self, message: &Message) {
        self.configured.push(message.payload().to_vec());
    }

    fn set_state(&mut self, message: &Message) {
        self.set_states.push(message.payload().to_vec());
    }

    fn request_state(&mut self, message: &Message) {
        self.state_requests.push(message.payload().to_vec());
        let current = self.set_states.last().cloned().unwrap_or_default();
        self.pending.push_back(current);
    }

    fn next_state(&mut self, outbound: &mut Message) -> bool {
        let Some(payload) = self.pending.pop_front() else {
            return false;
        };
        if let Err(e) = outbound.put_bytes(&payload) {
            warn!("Dropping oversized reading: {}", e);
            return false;
        }
        true
    }

    fn check_items(&mut self) {
        self.checks += 1;
    }
}
