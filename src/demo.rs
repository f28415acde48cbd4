//! 演示和示例代码
//!
//! 包含若干现成的场景构建函数

use crate::model::{
    AdjustConcentration, AdjustNeighbor, ConcentrationAtLeast, Environment, ExponentialRate,
    HasNeighbors, Molecule, NodeId, Position, ReactionTemplate,
};

/// 衰变链场景配置选项
#[derive(Debug, Clone)]
pub struct DecayChainOpts {
    pub initial_a: f64,
    pub rate_ab: f64,
    pub rate_bc: f64,
}

impl Default for DecayChainOpts {
    fn default() -> Self {
        Self {
            initial_a: 1000.0,
            rate_ab: 1.0,
            rate_bc: 0.5,
        }
    }
}

/// 构建单节点衰变链 A → B → C
///
/// 两条反应都按质量作用计倾向：A→B 的倾向等于 A 的浓度，
/// B→C 同理。返回承载反应的节点。
pub fn build_decay_chain(env: &mut Environment, opts: &DecayChainOpts) -> NodeId {
    let a = Molecule::new("A");
    let b = Molecule::new("B");
    let c = Molecule::new("C");

    let node = env.add_node(Position::ORIGIN);
    env.set_concentration(node, a.clone(), opts.initial_a)
        .expect("node exists");

    // A → B
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(ExponentialRate::new(opts.rate_ab)),
            conditions: vec![Box::new(ConcentrationAtLeast::new(a.clone(), 1.0))],
            actions: vec![
                Box::new(AdjustConcentration::new(a, -1.0)),
                Box::new(AdjustConcentration::new(b.clone(), 1.0)),
            ],
        },
    )
    .expect("node exists");
    // B → C
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(ExponentialRate::new(opts.rate_bc)),
            conditions: vec![Box::new(ConcentrationAtLeast::new(b.clone(), 1.0))],
            actions: vec![
                Box::new(AdjustConcentration::new(b, -1.0)),
                Box::new(AdjustConcentration::new(c, 1.0)),
            ],
        },
    )
    .expect("node exists");

    node
}

/// 网格扩散场景配置选项
#[derive(Debug, Clone)]
pub struct GridOpts {
    pub width: usize,
    pub height: usize,
    pub spacing: f64,
    pub spread_rate: f64,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            spacing: 1.0,
            spread_rate: 2.0,
        }
    }
}

/// 构建 width × height 网格上的邻域扩散场景
///
/// 节点按行优先排布，角落节点播种一单位 I；每个节点的反应在
/// 自身持有 I 且有邻居时向随机邻居投放一单位 I。环境的邻接规则
/// 由调用方配置，间距内相邻（range ≥ spacing）才会形成网格邻域。
/// 返回全部节点，行优先顺序。
pub fn build_spread_grid(env: &mut Environment, opts: &GridOpts) -> Vec<NodeId> {
    let marker = Molecule::new("I");
    let mut nodes = Vec::with_capacity(opts.width * opts.height);

    for row in 0..opts.height {
        for col in 0..opts.width {
            let position = Position::new(col as f64 * opts.spacing, row as f64 * opts.spacing);
            nodes.push(env.add_node(position));
        }
    }
    if let Some(&corner) = nodes.first() {
        env.set_concentration(corner, marker.clone(), 1.0)
            .expect("node exists");
    }
    for &node in &nodes {
        env.add_reaction(
            node,
            ReactionTemplate {
                rate: Box::new(ExponentialRate::new(opts.spread_rate)),
                conditions: vec![
                    Box::new(ConcentrationAtLeast::new(marker.clone(), 1.0)),
                    Box::new(HasNeighbors::new(1)),
                ],
                actions: vec![Box::new(AdjustNeighbor::new(marker.clone(), 1.0))],
            },
        )
        .expect("node exists");
    }

    nodes
}
