//! 影响范围与依赖声明
//!
//! 反应静态声明自己读写哪些实体、波及多大的拓扑范围。
//! 依赖图凭这两份声明推断一次发生之后需要重算的反应集合。

use super::molecule::Molecule;

/// 影响上下文：读或写波及的拓扑范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Context {
    /// 只涉及反应所在节点
    Local,
    /// 涉及所在节点及其直接邻居
    Neighborhood,
    /// 可能涉及任意节点
    Global,
}

impl Context {
    /// 对应的跳数半径；`Global` 无界。
    pub fn hop_radius(self) -> Option<usize> {
        match self {
            Context::Local => Some(0),
            Context::Neighborhood => Some(1),
            Context::Global => None,
        }
    }
}

/// 单个依赖项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// 通配：与任何读写相交
    Everything,
    /// 节点位置（含由位置导出的邻接关系）
    Position,
    /// 某种分子的浓度
    Molecule(Molecule),
}

impl Dependency {
    pub fn intersects(&self, other: &Dependency) -> bool {
        match (self, other) {
            (Dependency::Everything, _) | (_, Dependency::Everything) => true,
            (Dependency::Position, Dependency::Position) => true,
            (Dependency::Molecule(a), Dependency::Molecule(b)) => a == b,
            _ => false,
        }
    }
}

/// 写集与读集是否有交。
pub fn sets_intersect(writes: &[Dependency], reads: &[Dependency]) -> bool {
    writes.iter().any(|w| reads.iter().any(|r| w.intersects(r)))
}

/// 反应的完整影响声明，由其条件与动作聚合而来。
#[derive(Debug, Clone)]
pub struct ReactionInfluence {
    pub reads: Vec<Dependency>,
    pub writes: Vec<Dependency>,
    pub read_scope: Context,
    pub write_scope: Context,
}
