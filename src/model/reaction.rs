//! 反应
//!
//! 条件 + 动作 + 速率模型的组合，归属于单一节点。
//! 执行顺序：调度器按缓存时刻取出反应，条件全部放行才运行动作，
//! 动作产生的变化经依赖图传播给受影响的反应。

use crate::rng::SimRng;
use crate::sim::{SimTime, SimulationError};

use super::action::{Action, Effects};
use super::condition::Condition;
use super::context::{Context, ReactionInfluence};
use super::environment::Environment;
use super::id::{NodeId, ReactionId};
use super::rate::RateModel;

/// 尚未挂到节点上的反应描述。
#[derive(Debug)]
pub struct ReactionTemplate {
    pub rate: Box<dyn RateModel>,
    pub conditions: Vec<Box<dyn Condition>>,
    pub actions: Vec<Box<dyn Action>>,
}

/// 已注册的反应实例。
#[derive(Debug)]
pub struct Reaction {
    id: ReactionId,
    node: NodeId,
    rate: Box<dyn RateModel>,
    conditions: Vec<Box<dyn Condition>>,
    actions: Vec<Box<dyn Action>>,
}

impl Reaction {
    pub(crate) fn attach(id: ReactionId, node: NodeId, template: ReactionTemplate) -> Reaction {
        Reaction {
            id,
            node,
            rate: template.rate,
            conditions: template.conditions,
            actions: template.actions,
        }
    }

    pub fn id(&self) -> ReactionId {
        self.id
    }

    /// 所属节点
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// 缓存的下一次发生时刻
    pub fn next_occurrence(&self) -> SimTime {
        self.rate.tau()
    }

    /// 全部条件是否放行
    pub fn can_execute(&self, env: &Environment) -> bool {
        self.conditions.iter().all(|c| c.is_satisfied(self.node, env))
    }

    /// 条件聚合的倾向系数（各条件取乘积；无条件时为 1）
    pub fn propensity(&self, env: &Environment) -> f64 {
        self.conditions
            .iter()
            .map(|c| c.propensity(self.node, env))
            .product()
    }

    /// 依次执行全部动作；任何一步失败立即中止并带上失败反应的身份。
    pub fn execute(
        &self,
        env: &mut Environment,
        rng: &mut SimRng,
    ) -> Result<Effects, SimulationError> {
        let mut effects = Effects::default();
        for action in &self.actions {
            if let Err(e) = action.execute(self.node, env, rng, &mut effects) {
                return Err(SimulationError::Execution {
                    reaction: self.id,
                    node: self.node,
                    reason: e.to_string(),
                });
            }
        }
        Ok(effects)
    }

    /// 状态变化后重算发生时刻。`fired` 表示本反应就是刚发生的那个。
    pub fn update(&mut self, now: SimTime, fired: bool, env: &Environment, rng: &mut SimRng) {
        let propensity = self.propensity(env);
        self.rate.update(now, fired, propensity, rng);
    }

    /// 聚合条件与动作的静态影响声明。
    pub fn influence(&self) -> ReactionInfluence {
        let mut reads = Vec::new();
        let mut read_scope = Context::Local;
        for condition in &self.conditions {
            reads.extend(condition.reads());
            read_scope = read_scope.max(condition.scope());
        }
        let mut writes = Vec::new();
        let mut write_scope = Context::Local;
        for action in &self.actions {
            writes.extend(action.writes());
            write_scope = write_scope.max(action.scope());
        }
        ReactionInfluence {
            reads,
            writes,
            read_scope,
            write_scope,
        }
    }
}
