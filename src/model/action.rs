//! Actions mutate the environment when a reaction fires.

use crate::rng::SimRng;
use crate::sim::{EnvironmentError, SimulationError};

use super::context::{Context, Dependency};
use super::environment::Environment;
use super::id::NodeId;
use super::molecule::{Concentration, Molecule};

/// Runtime side effects of one firing that static declarations cannot
/// describe.
///
/// A move changes two neighborhoods at once and the old one is gone by
/// the time the dependency pass runs, so the pre-move neighbor set has
/// to be captured here.
#[derive(Debug, Default)]
pub struct Effects {
    pub moves: Vec<NodeMove>,
}

impl Effects {
    pub fn record_move(&mut self, node: NodeId, former_neighbors: Vec<NodeId>) {
        self.moves.push(NodeMove {
            node,
            former_neighbors,
        });
    }
}

#[derive(Debug)]
pub struct NodeMove {
    pub node: NodeId,
    pub former_neighbors: Vec<NodeId>,
}

/// One mutation step of a firing reaction.
pub trait Action: std::fmt::Debug + Send {
    /// Entities this action writes.
    fn writes(&self) -> Vec<Dependency>;

    /// Topological span of those writes.
    fn scope(&self) -> Context {
        Context::Local
    }

    fn execute(
        &self,
        node: NodeId,
        env: &mut Environment,
        rng: &mut SimRng,
        effects: &mut Effects,
    ) -> Result<(), SimulationError>;
}

/// Sets a molecule on the owning node to a fixed value.
#[derive(Debug, Clone)]
pub struct SetConcentration {
    molecule: Molecule,
    value: Concentration,
}

impl SetConcentration {
    pub fn new(molecule: Molecule, value: Concentration) -> SetConcentration {
        SetConcentration { molecule, value }
    }
}

impl Action for SetConcentration {
    fn writes(&self) -> Vec<Dependency> {
        vec![Dependency::Molecule(self.molecule.clone())]
    }

    fn execute(
        &self,
        node: NodeId,
        env: &mut Environment,
        _rng: &mut SimRng,
        _effects: &mut Effects,
    ) -> Result<(), SimulationError> {
        env.set_concentration(node, self.molecule.clone(), self.value)?;
        Ok(())
    }
}

/// Adds `delta` (possibly negative) to a molecule on the owning node,
/// clamping at zero.
#[derive(Debug, Clone)]
pub struct AdjustConcentration {
    molecule: Molecule,
    delta: f64,
}

impl AdjustConcentration {
    pub fn new(molecule: Molecule, delta: f64) -> AdjustConcentration {
        AdjustConcentration { molecule, delta }
    }
}

impl Action for AdjustConcentration {
    fn writes(&self) -> Vec<Dependency> {
        vec![Dependency::Molecule(self.molecule.clone())]
    }

    fn execute(
        &self,
        node: NodeId,
        env: &mut Environment,
        _rng: &mut SimRng,
        _effects: &mut Effects,
    ) -> Result<(), SimulationError> {
        env.adjust_concentration(node, self.molecule.clone(), self.delta)?;
        Ok(())
    }
}

/// Adds `delta` to a molecule on one uniformly chosen neighbor.
/// No-op when the owning node is isolated.
#[derive(Debug, Clone)]
pub struct AdjustNeighbor {
    molecule: Molecule,
    delta: f64,
}

impl AdjustNeighbor {
    pub fn new(molecule: Molecule, delta: f64) -> AdjustNeighbor {
        AdjustNeighbor { molecule, delta }
    }
}

impl Action for AdjustNeighbor {
    fn writes(&self) -> Vec<Dependency> {
        vec![Dependency::Molecule(self.molecule.clone())]
    }

    fn scope(&self) -> Context {
        Context::Neighborhood
    }

    fn execute(
        &self,
        node: NodeId,
        env: &mut Environment,
        rng: &mut SimRng,
        _effects: &mut Effects,
    ) -> Result<(), SimulationError> {
        let target = {
            let neighbors = env.neighbors_of(node);
            if neighbors.is_empty() {
                return Ok(());
            }
            neighbors[rng.next_index(neighbors.len())]
        };
        env.adjust_concentration(target, self.molecule.clone(), self.delta)?;
        Ok(())
    }
}

/// Moves the owning node one step of fixed length in a uniformly random
/// direction, relinking its neighborhood.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    step: f64,
}

impl RandomWalk {
    pub fn new(step: f64) -> RandomWalk {
        RandomWalk { step }
    }
}

impl Action for RandomWalk {
    fn writes(&self) -> Vec<Dependency> {
        vec![Dependency::Position]
    }

    fn scope(&self) -> Context {
        Context::Neighborhood
    }

    fn execute(
        &self,
        node: NodeId,
        env: &mut Environment,
        rng: &mut SimRng,
        effects: &mut Effects,
    ) -> Result<(), SimulationError> {
        let angle = rng.next_f64() * std::f64::consts::TAU;
        let former = env.neighbors_of(node).to_vec();
        let from = env
            .position_of(node)
            .ok_or(EnvironmentError::UnknownNode(node))?;
        let to = from.translated(self.step * angle.cos(), self.step * angle.sin());
        env.move_node(node, to)?;
        effects.record_move(node, former);
        Ok(())
    }
}
