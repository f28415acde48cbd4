//! 节点
//!
//! 节点持有位置、分子浓度与所属反应的 id 列表；
//! 反应本体存放在环境的反应竞技场中。

use std::collections::HashMap;

use super::id::{NodeId, ReactionId};
use super::molecule::{Concentration, Molecule};
use super::position::Position;

/// 仿真节点。
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    position: Position,
    contents: HashMap<Molecule, Concentration>,
    reactions: Vec<ReactionId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Position) -> Node {
        Node {
            id,
            position,
            contents: HashMap::new(),
            reactions: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// 某分子的浓度；未持有视为 0。
    pub fn concentration(&self, molecule: &Molecule) -> Concentration {
        self.contents.get(molecule).copied().unwrap_or(0.0)
    }

    // 浓度归零时直接从表里摘除，维持“未持有即为 0”的表示唯一性
    pub(crate) fn set_concentration(&mut self, molecule: Molecule, value: Concentration) {
        if value <= 0.0 {
            self.contents.remove(&molecule);
        } else {
            self.contents.insert(molecule, value);
        }
    }

    /// 调整浓度，下限为 0；返回调整后的值。
    pub(crate) fn adjust_concentration(&mut self, molecule: Molecule, delta: f64) -> Concentration {
        let next = (self.concentration(&molecule) + delta).max(0.0);
        self.set_concentration(molecule, next);
        next
    }

    /// 分子快照，按名字升序。
    pub fn contents_sorted(&self) -> Vec<(Molecule, Concentration)> {
        let mut all: Vec<(Molecule, Concentration)> = self
            .contents
            .iter()
            .map(|(m, c)| (m.clone(), *c))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// 挂在该节点上的反应 id（按注册顺序，即升序）。
    pub fn reactions(&self) -> &[ReactionId] {
        &self.reactions
    }

    pub(crate) fn attach_reaction(&mut self, id: ReactionId) {
        self.reactions.push(id);
    }

    pub(crate) fn detach_reaction(&mut self, id: ReactionId) {
        self.reactions.retain(|r| *r != id);
    }
}
