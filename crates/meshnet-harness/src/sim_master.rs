//! テスト用のマスター
//!
//! ノードから届いたフレームを検証し、ブートハンドシェイクに自動で応答する。
//!
//! ```text
//! booted   → configure を behavior.configure_payloads の数だけ返す
//! pong     → 全 configure 分の pong が揃ったら configured(S1) を返して S1 に移る
//! その他   → 記録するだけ
//! ```

use std::collections::HashMap;

use log::{debug, warn};

use meshnet_crypto::{Authenticator, Key};
use meshnet_proto::{Message, MessageType, Uptime16};
use meshnet_transport::{FrameHeader, NodeId, MASTER_ID};

/// ネットワーク上を流れる 1 フレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimFrame {
    /// トランスポート層のヘッダー
    pub header: FrameHeader,
    /// フレーム本体（タグ込み）
    pub bytes: Vec<u8>,
}

/// マスターが受信したフレームの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub header: FrameHeader,
    pub msg_type: Option<MessageType>,
    pub session_id: u16,
    pub counter: u16,
    pub payload: Vec<u8>,
    /// 認証・セッション・カウンタの検査を通ったか
    pub accepted: bool,
}

/// ノードごとのハンドシェイク進行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerPhase {
    /// configure を送り、pong を待っている
    Configuring {
        /// 受け取った pong の数
        pongs: usize,
    },
    /// configured を送った
    Configured,
}

#[derive(Debug, Clone)]
struct Peer {
    session_id: u16,
    own_counter: u16,
    last_counter: Option<u16>,
    phase: PeerPhase,
    boot_uptime: Option<Uptime16>,
    last_uptime: Option<Uptime16>,
}

impl Peer {
    fn adopt(&mut self, session_id: u16) {
        self.session_id = session_id;
        // ノードは 0 を再送として捨てるので 1 から始める
        self.own_counter = 1;
        self.last_counter = None;
    }

    fn accept_counter(&mut self, counter: u16) -> bool {
        match self.last_counter {
            Some(last) if counter <= last => false,
            _ => {
                self.last_counter = Some(counter);
                true
            }
        }
    }
}

/// マスターの応答方針
#[derive(Debug, Clone)]
pub struct MasterBehavior {
    /// false ならハンドシェイクに一切応答しない
    pub respond: bool,
    /// `booted` に対して返す configure のペイロード
    pub configure_payloads: Vec<Vec<u8>>,
    /// 最初に割り当てる運用セッション ID
    pub first_session: u16,
}

impl Default for MasterBehavior {
    fn default() -> Self {
        MasterBehavior {
            respond: true,
            configure_payloads: vec![vec![0x01, 0x02]],
            first_session: 0x5100,
        }
    }
}

/// テスト用のマスター
pub struct SimMaster {
    id: NodeId,
    auth: Authenticator,
    behavior: MasterBehavior,
    peers: HashMap<NodeId, Peer>,
    received: Vec<Received>,
    next_session: u16,
}

impl SimMaster {
    /// 既定の応答方針で生成する
    pub fn new(key: &Key) -> Self {
        Self::with_behavior(key, MasterBehavior::default())
    }

    /// 応答方針を指定して生成する
    pub fn with_behavior(key: &Key, behavior: MasterBehavior) -> Self {
        SimMaster {
            id: MASTER_ID,
            auth: Authenticator::new(key),
            next_session: behavior.first_session,
            behavior,
            peers: HashMap::new(),
            received: Vec::new(),
        }
    }

    /// マスターのノード ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 応答方針（可変）
    pub fn behavior_mut(&mut self) -> &mut MasterBehavior {
        &mut self.behavior
    }

    /// 受信記録
    pub fn received(&self) -> &[Received] {
        &self.received
    }

    /// 受理したメッセージの種別を受信順に返す
    pub fn accepted_types(&self, from: NodeId) -> Vec<MessageType> {
        self.received
            .iter()
            .filter(|r| r.accepted && r.header.from == from)
            .filter_map(|r| r.msg_type)
            .collect()
    }

    /// ノードと共有しているセッション ID
    pub fn session_of(&self, node: NodeId) -> Option<u16> {
        self.peers.get(&node).map(|p| p.session_id)
    }

    /// ノードとのハンドシェイク進行
    pub fn phase_of(&self, node: NodeId) -> Option<PeerPhase> {
        self.peers.get(&node).map(|p| p.phase)
    }

    /// `booted` から最後の `pong` までのノードのアップタイム差（ミリ秒、16 ビット）
    pub fn uptime_since_boot(&self, node: NodeId) -> Option<u16> {
        let peer = self.peers.get(&node)?;
        Some(peer.last_uptime?.elapsed_since(peer.boot_uptime?))
    }

    /// ノードから届いたフレームを処理し、応答フレームを返す
    pub fn on_frame(&mut self, header: FrameHeader, bytes: &[u8]) -> Vec<SimFrame> {
        let mut msg = Message::new();
        let len = bytes.len().min(Message::max_len());
        msg.raw_buffer_mut()[..len].copy_from_slice(&bytes[..len]);

        let msg_type = MessageType::from_tag(header.msg_type);
        let mut record = Received {
            header,
            msg_type,
            session_id: msg.session_id(),
            counter: msg.counter(),
            payload: Vec::new(),
            accepted: false,
        };

        if let Err(e) = msg.authenticate(&self.auth, header.from, header.to, header.msg_type, len) {
            warn!("Master dropped frame from {:#04x}: {}", header.from, e);
            self.received.push(record);
            return Vec::new();
        }
        record.payload = msg.payload().to_vec();

        if msg_type == Some(MessageType::Booted) {
            // 新しいブート。以前の状態は捨てる
            let uptime = Uptime16::read_from(&mut msg).ok();
            self.peers.insert(
                header.from,
                Peer {
                    session_id: record.session_id,
                    own_counter: 1,
                    last_counter: Some(record.counter),
                    phase: PeerPhase::Configuring { pongs: 0 },
                    boot_uptime: uptime,
                    last_uptime: uptime,
                },
            );
            record.accepted = true;
            self.received.push(record);
            debug!("Node {:#04x} booted in session {}", header.from, msg.session_id());
            return self.start_configuration(header);
        }

        let Some(peer) = self.peers.get_mut(&header.from) else {
            warn!("Frame from unknown node {:#04x}", header.from);
            self.received.push(record);
            return Vec::new();
        };
        if record.session_id != peer.session_id || !peer.accept_counter(record.counter) {
            warn!(
                "Master rejected {:?} from {:#04x} (session {}, counter {})",
                msg_type, header.from, record.session_id, record.counter
            );
            self.received.push(record);
            return Vec::new();
        }
        record.accepted = true;
        self.received.push(record);

        if msg_type != Some(MessageType::Pong) {
            return Vec::new();
        }
        if let Ok(uptime) = Uptime16::read_from(&mut msg) {
            peer.last_uptime = Some(uptime);
        }

        let PeerPhase::Configuring { pongs } = peer.phase else {
            return Vec::new();
        };
        let pongs = pongs + 1;
        peer.phase = PeerPhase::Configuring { pongs };
        if !self.behavior.respond || pongs < self.behavior.configure_payloads.len() {
            return Vec::new();
        }
        self.finish_configuration(header).into_iter().collect()
    }

    /// ノードにコマンドを送るフレームを作る
    pub fn command(&mut self, to: NodeId, msg_type: MessageType, payload: &[u8]) -> Option<SimFrame> {
        let header = FrameHeader::new(self.id, to, msg_type.tag());
        self.build(header, payload)
    }

    /// 新しいセッションを提案する `ping` を作り、以降はそのセッションで通信する
    pub fn ping(&mut self, to: NodeId, session_id: u16) -> Option<SimFrame> {
        let frame = self.command(to, MessageType::Ping, &session_id.to_be_bytes())?;
        // 同じ ID ならノードは何もしないので、こちらもカウンタを保つ
        if let Some(peer) = self.peers.get_mut(&to).filter(|p| p.session_id != session_id) {
            peer.adopt(session_id);
        }
        Some(frame)
    }

    fn start_configuration(&mut self, booted: FrameHeader) -> Vec<SimFrame> {
        if !self.behavior.respond {
            return Vec::new();
        }
        if self.behavior.configure_payloads.is_empty() {
            return self.finish_configuration(booted).into_iter().collect();
        }

        let payloads = self.behavior.configure_payloads.clone();
        payloads
            .iter()
            .filter_map(|payload| self.build(booted.reply(MessageType::Configure.tag()), payload))
            .collect()
    }

    fn finish_configuration(&mut self, incoming: FrameHeader) -> Option<SimFrame> {
        let session_id = self.next_session;
        self.next_session = self.next_session.wrapping_add(1);

        let frame = self.build(
            incoming.reply(MessageType::Configured.tag()),
            &session_id.to_be_bytes(),
        )?;
        let peer = self.peers.get_mut(&incoming.from)?;
        peer.adopt(session_id);
        peer.phase = PeerPhase::Configured;
        debug!("Node {:#04x} configured with session {}", incoming.from, session_id);
        Some(frame)
    }

    fn build(&mut self, header: FrameHeader, payload: &[u8]) -> Option<SimFrame> {
        let peer = self.peers.get_mut(&header.to)?;
        let counter = peer.own_counter;
        peer.own_counter = peer.own_counter.wrapping_add(1);

        let mut msg = Message::new();
        msg.init(peer.session_id, counter);
        msg.put_bytes(payload).ok()?;
        let bytes = msg
            .finalize(&self.auth, header.from, header.to, header.msg_type)
            .ok()?
            .to_vec();
        Some(SimFrame { header, bytes })
    }
}
