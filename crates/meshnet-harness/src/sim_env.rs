//! 仮想時計による `Environment` 実装

use std::cell::Cell;
use std::rc::Rc;

use meshnet_node::Environment;

/// 仮想時計
///
/// - `now_ms` は読むたびに `tick_ms` だけ進む（ビジーループでも時間が経つ）
/// - `delay_ms` は待たずに時計を進める
/// - クローンは同じ時計を共有する。テスト側はクローンを持っておけば
///   ノードに渡した後でも時計を操作できる
#[derive(Debug, Clone)]
pub struct SimEnv {
    clock_ms: Rc<Cell<u64>>,
    delayed_ms: Rc<Cell<u64>>,
    tick_ms: u64,
    /// `now_us` に足すオフセット（ノードごとにセッション ID をずらす）
    us_offset: u64,
}

impl SimEnv {
    /// 時刻 0、1 回の読み出しごとに 1 ms 進む時計
    pub fn new() -> Self {
        Self::with_tick(1)
    }

    /// 読み出しごとの進み幅を指定する。0 なら `advance` でしか進まない
    pub fn with_tick(tick_ms: u64) -> Self {
        SimEnv {
            clock_ms: Rc::new(Cell::new(0)),
            delayed_ms: Rc::new(Cell::new(0)),
            tick_ms,
            us_offset: 0,
        }
    }

    /// `now_us` のオフセットを設定する
    pub fn with_us_offset(mut self, us_offset: u64) -> Self {
        self.us_offset = us_offset;
        self
    }

    /// 現在時刻（時計を進めない）
    pub fn peek_ms(&self) -> u64 {
        self.clock_ms.get()
    }

    /// 時計を進める
    pub fn advance(&self, ms: u64) {
        self.clock_ms.set(self.clock_ms.get() + ms);
    }

    /// `delay_ms` で待った時間の合計
    pub fn total_delay_ms(&self) -> u64 {
        self.delayed_ms.get()
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now_ms(&self) -> u64 {
        let now = self.clock_ms.get();
        self.clock_ms.set(now + self.tick_ms);
        now
    }

    fn now_us(&self) -> u64 {
        self.clock_ms.get() * 1_000 + self.us_offset
    }

    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
        self.delayed_ms.set(self.delayed_ms.get() + ms);
    }
}
