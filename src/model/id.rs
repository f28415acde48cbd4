//! 标识符类型
//!
//! 定义节点和反应的唯一标识符。

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// 反应标识符
///
/// 同时充当调度与依赖传播中的确定性决胜键：时间相同的反应按 id 从小到大执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId(pub usize);
