//! 依赖图
//!
//! 回答“这次发生之后，哪些反应的时刻需要重算”。边不做全量物化：
//! 同节点的静态边按节点版本号缓存，跨节点部分在发生后按写范围做
//! 受限 BFS 现算，全局读者单独维护在注册表里。结果宁可多算不可
//! 漏算：多余的重算不改变可观测轨迹，漏掉的会。

use tracing::trace;

use crate::model::{
    Context, Dependency, Effects, Environment, NodeId, ReactionId, ReactionInfluence,
    sets_intersect,
};

use super::error::SimulationError;

/// 反应依赖图。
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// 节点版本号；节点的反应集变动时递增，用于失效同节点缓存
    node_stamps: Vec<u64>,
    /// 反应 id → 同节点受影响反应的缓存
    local_cache: Vec<Option<LocalCache>>,
    /// 读范围为 Global 的反应注册表，升序
    global_readers: Vec<ReactionId>,
}

#[derive(Debug)]
struct LocalCache {
    stamp: u64,
    /// 同节点上读集与本反应写集相交的反应（不含自身）
    edges: Vec<ReactionId>,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    /// 反应注册后登记其全局读者身份并失效所在节点的缓存。
    pub fn reaction_added(&mut self, env: &Environment, id: ReactionId) {
        let reaction = env.reaction(id).expect("registered reaction exists");
        self.bump_node(reaction.node());
        if self.local_cache.len() <= id.0 {
            self.local_cache.resize_with(id.0 + 1, || None);
        }
        if reaction.influence().read_scope == Context::Global {
            let at = self.global_readers.partition_point(|r| *r < id);
            self.global_readers.insert(at, id);
        }
    }

    /// 反应移除后同步注销。
    pub fn reaction_removed(&mut self, id: ReactionId, node: NodeId) {
        self.bump_node(node);
        if let Some(slot) = self.local_cache.get_mut(id.0) {
            *slot = None;
        }
        self.global_readers.retain(|r| *r != id);
    }

    /// 全局读者注册表（升序）。
    pub fn global_readers(&self) -> &[ReactionId] {
        &self.global_readers
    }

    /// 写声明必须与波及范围自洽，否则依赖传播必然漏边。
    pub fn check_declared(
        &self,
        id: ReactionId,
        influence: &ReactionInfluence,
    ) -> Result<(), SimulationError> {
        let writes_position = influence
            .writes
            .iter()
            .any(|w| matches!(w, Dependency::Position));
        if writes_position && influence.write_scope == Context::Local {
            return Err(SimulationError::InvalidModel(format!(
                "reaction {id:?} moves nodes but declares a local-only write scope"
            )));
        }
        let writes_everything = influence
            .writes
            .iter()
            .any(|w| matches!(w, Dependency::Everything));
        if writes_everything && influence.write_scope != Context::Global {
            return Err(SimulationError::InvalidModel(format!(
                "reaction {id:?} writes everything but does not declare a global write scope"
            )));
        }
        Ok(())
    }

    /// 反应 `fired` 发生后需要重算的反应集合，升序去重，恒含自身。
    pub fn affected_by(
        &mut self,
        fired: ReactionId,
        effects: &Effects,
        env: &Environment,
    ) -> Result<Vec<ReactionId>, SimulationError> {
        let reaction = env.reaction(fired).expect("fired reaction exists");
        let origin = reaction.node();
        let influence = reaction.influence();
        self.check_declared(fired, &influence)?;

        let mut out: Vec<ReactionId> = vec![fired];

        // 1. 同节点静态边（带版本号缓存）
        self.extend_from_local(&mut out, fired, origin, &influence, env);

        // 2. 跨节点传播
        match influence.write_scope.hop_radius() {
            None => {
                // 全局写：全量扫描
                for rid in env.reaction_ids() {
                    if rid == fired {
                        continue;
                    }
                    let other = env.reaction(rid).expect("live reaction exists");
                    if sets_intersect(&influence.writes, &other.influence().reads) {
                        out.push(rid);
                    }
                }
            }
            Some(w) => {
                // 候选 = 写半径 + 最大读半径(1) 内的节点；写半径为 0
                // 也要扫直接邻居，邻域读者读得到本节点上的写。
                // 移动过的节点及其移动前的邻居也都是写入点
                let mut seeds: Vec<NodeId> = vec![origin];
                for mv in &effects.moves {
                    seeds.push(mv.node);
                    seeds.extend_from_slice(&mv.former_neighbors);
                }
                for (node, dist) in env.nodes_within_hops(&seeds, w + 1) {
                    for &rid in env.node(node).expect("scanned node exists").reactions() {
                        if rid == fired {
                            continue;
                        }
                        let other = env.reaction(rid).expect("live reaction exists");
                        let oi = other.influence();
                        let Some(reach) = oi.read_scope.hop_radius() else {
                            // 全局读者走注册表
                            continue;
                        };
                        if dist <= w + reach
                            && sets_intersect(&influence.writes, &oi.reads)
                        {
                            out.push(rid);
                        }
                    }
                }
            }
        }

        // 3. 全局读者
        for &rid in &self.global_readers {
            if rid == fired {
                continue;
            }
            let other = env.reaction(rid).expect("registered reader exists");
            if sets_intersect(&influence.writes, &other.influence().reads) {
                out.push(rid);
            }
        }

        out.sort_unstable();
        out.dedup();
        trace!(fired = fired.0, affected = out.len(), "依赖传播");
        Ok(out)
    }

    /// 保守的方向性判断：`a` 的一次发生是否可能影响 `b` 的时刻。
    /// 只看静态声明，移动等运行期效果按声明的写范围处理。
    pub fn may_influence(&self, a: ReactionId, b: ReactionId, env: &Environment) -> bool {
        if a == b {
            return true;
        }
        let (ra, rb) = match (env.reaction(a), env.reaction(b)) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };
        let ia = ra.influence();
        let ib = rb.influence();
        if !sets_intersect(&ia.writes, &ib.reads) {
            return false;
        }
        let reach = match (ia.write_scope.hop_radius(), ib.read_scope.hop_radius()) {
            (Some(w), Some(r)) => w + r,
            _ => return true,
        };
        env.nodes_within_hops(&[ra.node()], reach)
            .iter()
            .any(|(n, _)| *n == rb.node())
    }

    /// 批量提交窗口的冲突判定：读写或写写在拓扑可达范围内相交。
    pub fn conflicts(&self, a: ReactionId, b: ReactionId, env: &Environment) -> bool {
        if a == b {
            return true;
        }
        let (ra, rb) = match (env.reaction(a), env.reaction(b)) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };
        let ia = ra.influence();
        let ib = rb.influence();
        let touches = sets_intersect(&ia.writes, &ib.reads)
            || sets_intersect(&ib.writes, &ia.reads)
            || sets_intersect(&ia.writes, &ib.writes);
        if !touches {
            return false;
        }
        let side = |write: Option<usize>, read: Option<usize>| -> Option<usize> {
            Some(write?.max(read?))
        };
        let reach = match (
            side(ia.write_scope.hop_radius(), ia.read_scope.hop_radius()),
            side(ib.write_scope.hop_radius(), ib.read_scope.hop_radius()),
        ) {
            (Some(x), Some(y)) => x + y,
            _ => return true,
        };
        env.nodes_within_hops(&[ra.node()], reach)
            .iter()
            .any(|(n, _)| *n == rb.node())
    }

    fn bump_node(&mut self, node: NodeId) {
        if self.node_stamps.len() <= node.0 {
            self.node_stamps.resize(node.0 + 1, 0);
        }
        self.node_stamps[node.0] += 1;
    }

    fn stamp_of(&self, node: NodeId) -> u64 {
        self.node_stamps.get(node.0).copied().unwrap_or(0)
    }

    fn extend_from_local(
        &mut self,
        out: &mut Vec<ReactionId>,
        fired: ReactionId,
        origin: NodeId,
        influence: &ReactionInfluence,
        env: &Environment,
    ) {
        let stamp = self.stamp_of(origin);
        if self.local_cache.len() <= fired.0 {
            self.local_cache.resize_with(fired.0 + 1, || None);
        }
        let stale = !matches!(&self.local_cache[fired.0], Some(c) if c.stamp == stamp);
        if stale {
            let mut edges = Vec::new();
            for &rid in env.node(origin).expect("origin node exists").reactions() {
                if rid == fired {
                    continue;
                }
                let other = env.reaction(rid).expect("live reaction exists");
                if sets_intersect(&influence.writes, &other.influence().reads) {
                    edges.push(rid);
                }
            }
            self.local_cache[fired.0] = Some(LocalCache { stamp, edges });
        }
        let cache = self.local_cache[fired.0].as_ref().expect("cache filled");
        out.extend_from_slice(&cache.edges);
    }
}
