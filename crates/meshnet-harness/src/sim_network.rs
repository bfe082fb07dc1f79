//! インメモリのメッシュネットワーク
//!
//! 1 つの `SimMaster` と任意個のノードを同じプロセス内でつなぐ。
//! ノードがマスター宛てに書いたフレームはその場でマスターに渡され、
//! 応答は宛先ノードの受信キューに積まれる。

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use log::trace;

use meshnet_proto::MessageType;
use meshnet_transport::{FrameHeader, NodeId};

use crate::sim_master::{SimFrame, SimMaster};
use crate::sim_transport::SimTransport;

struct NetworkState {
    master: SimMaster,
    inboxes: HashMap<NodeId, VecDeque<SimFrame>>,
    /// ノードが書き込みに成功したフレーム
    sent: Vec<SimFrame>,
    /// ノードの受信キューに積んだフレーム
    delivered: Vec<SimFrame>,
}

impl NetworkState {
    fn enqueue(&mut self, frame: SimFrame) {
        trace!("Queue frame for {:#04x}", frame.header.to);
        self.delivered.push(frame.clone());
        self.inboxes.entry(frame.header.to).or_default().push_back(frame);
    }
}

/// インメモリのメッシュネットワーク（クローンは同じネットワークを指す）
#[derive(Clone)]
pub struct SimNetwork {
    state: Rc<RefCell<NetworkState>>,
}

impl SimNetwork {
    /// マスターを 1 つ置いたネットワークを作る
    pub fn new(master: SimMaster) -> Self {
        SimNetwork {
            state: Rc::new(RefCell::new(NetworkState {
                master,
                inboxes: HashMap::new(),
                sent: Vec::new(),
                delivered: Vec::new(),
            })),
        }
    }

    /// 未プロビジョニングのノード用トランスポートを作る
    pub fn transport(&self) -> SimTransport {
        SimTransport::new(self.clone())
    }

    /// トランスポートからの書き込み
    pub(crate) fn deliver(&self, header: FrameHeader, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let frame = SimFrame {
            header,
            bytes: bytes.to_vec(),
        };
        state.sent.push(frame.clone());

        if header.to == state.master.id() {
            let replies = state.master.on_frame(header, bytes);
            for reply in replies {
                state.enqueue(reply);
            }
        } else {
            state.enqueue(frame);
        }
    }

    pub(crate) fn front(&self, node: NodeId) -> Option<FrameHeader> {
        let state = self.state.borrow();
        state.inboxes.get(&node)?.front().map(|f| f.header)
    }

    pub(crate) fn pop(&self, node: NodeId) -> Option<SimFrame> {
        self.state.borrow_mut().inboxes.get_mut(&node)?.pop_front()
    }

    /// ノードの受信キューに直接フレームを積む
    pub fn inject(&self, frame: SimFrame) {
        self.state.borrow_mut().enqueue(frame);
    }

    /// マスターからノードへコマンドを送る。フレームを作れなければ false
    pub fn master_send(&self, to: NodeId, msg_type: MessageType, payload: &[u8]) -> bool {
        let mut state = self.state.borrow_mut();
        match state.master.command(to, msg_type, payload) {
            Some(frame) => {
                state.enqueue(frame);
                true
            }
            None => false,
        }
    }

    /// マスターからノードへ新しいセッションを提案する
    pub fn master_ping(&self, to: NodeId, session_id: u16) -> bool {
        let mut state = self.state.borrow_mut();
        match state.master.ping(to, session_id) {
            Some(frame) => {
                state.enqueue(frame);
                true
            }
            None => false,
        }
    }

    /// マスターを参照する
    pub fn master<F, U>(&self, f: F) -> U
    where
        F: FnOnce(&SimMaster) -> U,
    {
        f(&self.state.borrow().master)
    }

    /// マスターを操作する
    pub fn master_mut<F, U>(&self, f: F) -> U
    where
        F: FnOnce(&mut SimMaster) -> U,
    {
        f(&mut self.state.borrow_mut().master)
    }

    /// `from` が書き込んだフレーム
    pub fn sent_by(&self, from: NodeId) -> Vec<SimFrame> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter(|f| f.header.from == from)
            .cloned()
            .collect()
    }

    /// `to` の受信キューに積まれた最後のフレーム（消費済みでも返す）
    pub fn last_delivered_to(&self, to: NodeId) -> Option<SimFrame> {
        self.state
            .borrow()
            .delivered
            .iter()
            .rev()
            .find(|f| f.header.to == to)
            .cloned()
    }

    /// `to` の受信キューに残っているフレーム数
    pub fn pending_for(&self, to: NodeId) -> usize {
        self.state
            .borrow()
            .inboxes
            .get(&to)
            .map_or(0, VecDeque::len)
    }
}
