//! 环境
//!
//! 持有全部节点与反应的竞技场，维护由邻接规则导出的邻居表。
//! 执行期通过 take/put 把单个反应临时移出，换取对环境其余部分的
//! 独占可变访问。

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::sim::EnvironmentError;

use super::id::{NodeId, ReactionId};
use super::linking::LinkingRule;
use super::molecule::{Concentration, Molecule};
use super::node::Node;
use super::position::Position;
use super::reaction::{Reaction, ReactionTemplate};

const NO_NEIGHBORS: &[NodeId] = &[];

/// 仿真环境。
#[derive(Debug)]
pub struct Environment {
    nodes: Vec<Option<Node>>,
    reactions: Vec<Option<Reaction>>,
    /// 与 nodes 平行的邻居表，各表恒按 id 升序
    neighborhoods: Vec<Vec<NodeId>>,
    linking: Box<dyn LinkingRule>,
}

impl Environment {
    pub fn new(linking: Box<dyn LinkingRule>) -> Environment {
        Environment {
            nodes: Vec::new(),
            reactions: Vec::new(),
            neighborhoods: Vec::new(),
            linking,
        }
    }

    /// 新建节点并按邻接规则接入。
    pub fn add_node(&mut self, position: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(id, position)));
        self.neighborhoods.push(Vec::new());
        self.relink(id);
        debug!(node = id.0, x = position.x, y = position.y, "节点已加入");
        id
    }

    /// 移除节点及其全部反应；返回被移除的反应 id（升序）。
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<ReactionId>, EnvironmentError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(EnvironmentError::UnknownNode(id))?;
        let removed = node.reactions().to_vec();
        for rid in &removed {
            self.reactions[rid.0] = None;
        }
        let neighbors = std::mem::take(&mut self.neighborhoods[id.0]);
        for n in neighbors {
            self.neighborhoods[n.0].retain(|x| *x != id);
        }
        debug!(node = id.0, reactions = removed.len(), "节点已移除");
        Ok(removed)
    }

    /// 把反应挂到节点上，分配全局唯一 id。
    pub fn add_reaction(
        &mut self,
        node: NodeId,
        template: ReactionTemplate,
    ) -> Result<ReactionId, EnvironmentError> {
        if self.node(node).is_none() {
            return Err(EnvironmentError::UnknownNode(node));
        }
        let id = ReactionId(self.reactions.len());
        self.reactions.push(Some(Reaction::attach(id, node, template)));
        self.nodes[node.0]
            .as_mut()
            .expect("node exists")
            .attach_reaction(id);
        trace!(reaction = id.0, node = node.0, "反应已注册");
        Ok(id)
    }

    /// 摘除单个反应。
    pub fn remove_reaction(&mut self, id: ReactionId) -> Result<(), EnvironmentError> {
        let reaction = self
            .reactions
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(EnvironmentError::UnknownReaction(id))?;
        if let Some(owner) = self.nodes.get_mut(reaction.node().0).and_then(|s| s.as_mut()) {
            owner.detach_reaction(id);
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|s| s.as_ref())
    }

    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.reactions.get(id.0).and_then(|s| s.as_ref())
    }

    /// 执行期独占借用：把反应移出竞技场，用完必须 put 回去。
    pub(crate) fn take_reaction(&mut self, id: ReactionId) -> Option<Reaction> {
        self.reactions.get_mut(id.0).and_then(Option::take)
    }

    pub(crate) fn put_reaction(&mut self, id: ReactionId, reaction: Reaction) {
        self.reactions[id.0] = Some(reaction);
    }

    pub fn position_of(&self, id: NodeId) -> Option<Position> {
        self.node(id).map(|n| n.position())
    }

    /// 移动节点并重算其邻接关系。
    pub fn move_node(&mut self, id: NodeId, to: Position) -> Result<(), EnvironmentError> {
        match self.nodes.get_mut(id.0).and_then(|s| s.as_mut()) {
            Some(node) => node.set_position(to),
            None => return Err(EnvironmentError::UnknownNode(id)),
        }
        self.relink(id);
        trace!(node = id.0, x = to.x, y = to.y, "节点已移动");
        Ok(())
    }

    /// 节点上某分子的浓度；节点或分子不存在都视为 0。
    pub fn concentration(&self, node: NodeId, molecule: &Molecule) -> Concentration {
        self.node(node).map(|n| n.concentration(molecule)).unwrap_or(0.0)
    }

    pub fn set_concentration(
        &mut self,
        node: NodeId,
        molecule: Molecule,
        value: Concentration,
    ) -> Result<(), EnvironmentError> {
        match self.nodes.get_mut(node.0).and_then(|s| s.as_mut()) {
            Some(n) => {
                n.set_concentration(molecule, value);
                Ok(())
            }
            None => Err(EnvironmentError::UnknownNode(node)),
        }
    }

    /// 调整浓度（下限 0），返回调整后的值。
    pub fn adjust_concentration(
        &mut self,
        node: NodeId,
        molecule: Molecule,
        delta: f64,
    ) -> Result<Concentration, EnvironmentError> {
        match self.nodes.get_mut(node.0).and_then(|s| s.as_mut()) {
            Some(n) => Ok(n.adjust_concentration(molecule, delta)),
            None => Err(EnvironmentError::UnknownNode(node)),
        }
    }

    /// 节点的直接邻居（升序）；未知节点返回空。
    pub fn neighbors_of(&self, id: NodeId) -> &[NodeId] {
        self.neighborhoods
            .get(id.0)
            .map(Vec::as_slice)
            .unwrap_or(NO_NEIGHBORS)
    }

    /// 从种子集合出发的受限 BFS，返回 (节点, 跳数)，按节点 id 升序。
    /// 种子本身跳数为 0。
    pub fn nodes_within_hops(&self, seeds: &[NodeId], hops: usize) -> Vec<(NodeId, usize)> {
        let mut dist: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        for &seed in seeds {
            if seed.0 < dist.len() && self.nodes[seed.0].is_some() && dist[seed.0].is_none() {
                dist[seed.0] = Some(0);
                queue.push_back(seed);
            }
        }

        while let Some(v) = queue.pop_front() {
            let dv = dist[v.0].expect("visited node has distance");
            if dv == hops {
                continue;
            }
            for &n in self.neighbors_of(v) {
                if dist[n.0].is_none() {
                    dist[n.0] = Some(dv + 1);
                    queue.push_back(n);
                }
            }
        }

        dist.iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (NodeId(i), d)))
            .collect()
    }

    /// 存活节点 id，升序。
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| NodeId(i)))
    }

    /// 存活反应 id，升序。
    pub fn reaction_ids(&self) -> impl Iterator<Item = ReactionId> + '_ {
        self.reactions
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| ReactionId(i)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|s| s.is_some()).count()
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.iter().filter(|s| s.is_some()).count()
    }

    // 重算 id 的邻居集并同步双向表
    fn relink(&mut self, id: NodeId) {
        let pos = match self.nodes[id.0].as_ref() {
            Some(n) => n.position(),
            None => return,
        };

        let mut fresh: Vec<NodeId> = Vec::new();
        for (idx, slot) in self.nodes.iter().enumerate() {
            if idx == id.0 {
                continue;
            }
            if let Some(other) = slot {
                if self.linking.connected(pos, other.position()) {
                    fresh.push(NodeId(idx));
                }
            }
        }

        // 先从不再相邻的旧邻居里摘掉自己，再把自己插进新邻居
        let old = std::mem::take(&mut self.neighborhoods[id.0]);
        for n in old {
            if !fresh.contains(&n) {
                self.neighborhoods[n.0].retain(|x| *x != id);
            }
        }
        for &n in &fresh {
            let peers = &mut self.neighborhoods[n.0];
            if !peers.contains(&id) {
                let at = peers.partition_point(|x| *x < id);
                peers.insert(at, id);
            }
        }
        self.neighborhoods[id.0] = fresh;
    }
}
