//! 邻接规则
//!
//! 由节点位置判定邻居关系。替换规则即可改变整个空间拓扑语义，
//! 环境与引擎对具体几何无感知。

use super::position::Position;

/// 邻接规则抽象
pub trait LinkingRule: std::fmt::Debug + Send {
    /// 两个位置是否互为邻居
    fn connected(&self, a: Position, b: Position) -> bool;
}

/// 欧氏距离不超过 `range` 即互为邻居。
#[derive(Debug, Clone, Copy)]
pub struct ConnectWithinRange {
    pub range: f64,
}

impl LinkingRule for ConnectWithinRange {
    fn connected(&self, a: Position, b: Position) -> bool {
        a.distance_to(b) <= self.range
    }
}

/// 所有节点彼此孤立。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkingRule for NoLinks {
    fn connected(&self, _a: Position, _b: Position) -> bool {
        false
    }
}
