//! トランスポート層のフレームヘッダー

/// 論理ノード ID
pub type NodeId = u8;

/// マスターの既定ノード ID
pub const MASTER_ID: NodeId = 0;

/// トランスポート層から見えるフレームのヘッダー
///
/// `from` / `to` はトランスポートのアドレスから論理ノード ID に解決済みの値。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// 送信元ノード ID
    pub from: NodeId,
    /// 宛先ノード ID
    pub to: NodeId,
    /// メッセージ種別タグ
    pub msg_type: u8,
}

impl FrameHeader {
    /// ヘッダーを構築する
    pub const fn new(from: NodeId, to: NodeId, msg_type: u8) -> Self {
        FrameHeader { from, to, msg_type }
    }

    /// 返信用に送信元と宛先を入れ替えたヘッダー
    pub const fn reply(&self, msg_type: u8) -> Self {
        FrameHeader {
            from: self.to,
            to: self.from,
            msg_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_swaps_endpoints() {
        let header = FrameHeader::new(MASTER_ID, 3, 4);
        let reply = header.reply(5);
        assert_eq!(reply, FrameHeader::new(3, MASTER_ID, 5));
    }
}
