//! 仿真时间类型
//!
//! 定义连续仿真时间（秒）及其全序比较。

use std::cmp::Ordering;
use std::ops::Add;

/// 仿真时间（秒）。
///
/// 取值域限定为非负有限数或正无穷（正无穷表示“当前不可能发生”）。
/// 在该域上 `total_cmp` 与普通数值比较一致，因此可以安全实现 `Ord`，
/// 供调度器做 (时间, 反应 id) 的字典序决胜。
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);
    /// 哨兵值：反应在当前状态下永不发生。
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    pub fn from_secs(s: f64) -> SimTime {
        debug_assert!(s >= 0.0, "sim time must be non-negative, got {s}");
        SimTime(s)
    }

    pub fn from_millis(ms: f64) -> SimTime {
        SimTime::from_secs(ms / 1_000.0)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    pub fn is_infinite(self) -> bool {
        self.0.is_infinite()
    }

    /// 两个时刻的间隔；后项更大时返回零而不是负值。
    pub fn saturating_sub(self, earlier: SimTime) -> SimTime {
        SimTime((self.0 - earlier.0).max(0.0))
    }
}

impl Add for SimTime {
    type Output = SimTime;

    // 非负数相加不会产生 NaN，上溢自然饱和到正无穷。
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
