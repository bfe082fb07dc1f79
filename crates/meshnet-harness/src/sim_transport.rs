//! `SimNetwork` 上の `Transport` 実装

use log::debug;

use meshnet_transport::{FrameHeader, NodeId, Transport};

use crate::sim_network::SimNetwork;

/// 未プロビジョニングのトランスポートが持つ ID
pub const UNPROVISIONED_ID: NodeId = 0xFF;

/// トランスポートの呼び出し回数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    pub identity_writes: usize,
    pub bring_ups: usize,
    pub updates: usize,
    pub writes: usize,
    pub failed_writes: usize,
    pub liveness_checks: usize,
    pub renewals: usize,
}

/// インメモリのメッシュリンク
///
/// 書き込み失敗とリンク断を台本どおりに起こせる。
pub struct SimTransport {
    network: SimNetwork,
    identity: NodeId,
    alive: bool,
    failing_writes: usize,
    stats: TransportStats,
}

impl SimTransport {
    pub(crate) fn new(network: SimNetwork) -> Self {
        SimTransport {
            network,
            identity: UNPROVISIONED_ID,
            alive: true,
            failing_writes: 0,
            stats: TransportStats::default(),
        }
    }

    /// 不揮発領域に ID が書き込み済みの状態にする（書き込み回数には数えない）
    pub fn provision(&mut self, id: NodeId) {
        self.identity = id;
    }

    /// 次の `n` 回の書き込みを失敗させる
    pub fn fail_next_writes(&mut self, n: usize) {
        self.failing_writes = n;
    }

    /// リンクの生死を設定する。`renew` で生き返る
    pub fn set_link_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    /// 呼び出し回数
    pub fn stats(&self) -> TransportStats {
        self.stats
    }
}

impl Transport for SimTransport {
    fn identity(&self) -> NodeId {
        self.identity
    }

    fn set_identity(&mut self, id: NodeId) {
        self.stats.identity_writes += 1;
        self.identity = id;
    }

    fn bring_up(&mut self) {
        self.stats.bring_ups += 1;
    }

    fn update(&mut self) {
        self.stats.updates += 1;
    }

    fn check_liveness(&mut self) -> bool {
        self.stats.liveness_checks += 1;
        self.alive
    }

    fn renew(&mut self) {
        debug!("Renew address of {:#04x}", self.identity);
        self.stats.renewals += 1;
        self.alive = true;
    }

    fn poll(&mut self) -> bool {
        self.network.front(self.identity).is_some()
    }

    fn peek(&mut self) -> Option<FrameHeader> {
        self.network.front(self.identity)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let Some(frame) = self.network.pop(self.identity) else {
            return 0;
        };
        let n = frame.bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&frame.bytes[..n]);
        n
    }

    fn write(&mut self, destination: NodeId, frame: &[u8], msg_type: u8) -> bool {
        self.stats.writes += 1;
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            self.stats.failed_writes += 1;
            return false;
        }
        self.network
            .deliver(FrameHeader::new(self.identity, destination, msg_type), frame);
        true
    }
}
