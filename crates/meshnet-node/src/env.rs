//! 時刻と待機の抽象化
//!
//! プロトコルエンジンは時計を直接読まず、`Environment` 経由で時刻を得る。
//! 実機ではハードウェアタイマー、テストでは仮想時計を注入する。

/// 時刻と待機を提供する環境
///
/// `now_ms` / `now_us` は単調非減少でなければならない。
pub trait Environment {
    /// 起動後の経過時間（ミリ秒）
    fn now_ms(&self) -> u64;

    /// フリーランニングのマイクロ秒カウンタ
    ///
    /// 再起動をまたいで衝突しにくいセッション ID の種に使う。
    fn now_us(&self) -> u64;

    /// 指定ミリ秒だけ待機する
    fn delay_ms(&mut self, ms: u64);
}
