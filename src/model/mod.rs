//! 模型模块
//!
//! 此模块包含多智能体空间模型的核心组件：节点、分子、位置、
//! 邻接规则与反应。

// 子模块声明
mod action;
mod condition;
mod context;
mod environment;
mod id;
mod linking;
mod molecule;
mod node;
mod position;
mod rate;
mod reaction;

// 重新导出公共接口
pub use action::{
    Action, AdjustConcentration, AdjustNeighbor, Effects, NodeMove, RandomWalk, SetConcentration,
};
pub use condition::{ConcentrationAtLeast, Condition, HasNeighbors};
pub use context::{Context, Dependency, ReactionInfluence, sets_intersect};
pub use environment::Environment;
pub use id::{NodeId, ReactionId};
pub use linking::{ConnectWithinRange, LinkingRule, NoLinks};
pub use molecule::{Concentration, Molecule};
pub use node::Node;
pub use position::Position;
pub use rate::{ExponentialRate, FixedInterval, RateModel, Trigger};
pub use reaction::{Reaction, ReactionTemplate};
