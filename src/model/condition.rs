//! Conditions gate reaction execution and feed its propensity.

use super::context::{Context, Dependency};
use super::environment::Environment;
use super::id::NodeId;
use super::molecule::{Concentration, Molecule};

/// Guard on a reaction. Every condition must hold for the actions to run.
pub trait Condition: std::fmt::Debug + Send {
    /// Entities this condition reads.
    fn reads(&self) -> Vec<Dependency>;

    /// Topological span of those reads.
    fn scope(&self) -> Context {
        Context::Local
    }

    fn is_satisfied(&self, node: NodeId, env: &Environment) -> bool;

    /// Multiplier applied to the base rate; 0 when unsatisfied.
    fn propensity(&self, node: NodeId, env: &Environment) -> f64 {
        if self.is_satisfied(node, env) { 1.0 } else { 0.0 }
    }
}

/// Requires at least `threshold` of a molecule on the owning node.
///
/// Mass-action semantics: while satisfied, the propensity equals the
/// current concentration, so doubling the amount doubles the effective
/// rate.
#[derive(Debug, Clone)]
pub struct ConcentrationAtLeast {
    molecule: Molecule,
    threshold: Concentration,
}

impl ConcentrationAtLeast {
    pub fn new(molecule: Molecule, threshold: Concentration) -> ConcentrationAtLeast {
        ConcentrationAtLeast { molecule, threshold }
    }
}

impl Condition for ConcentrationAtLeast {
    fn reads(&self) -> Vec<Dependency> {
        vec![Dependency::Molecule(self.molecule.clone())]
    }

    fn is_satisfied(&self, node: NodeId, env: &Environment) -> bool {
        env.concentration(node, &self.molecule) >= self.threshold
    }

    fn propensity(&self, node: NodeId, env: &Environment) -> f64 {
        let have = env.concentration(node, &self.molecule);
        if have >= self.threshold { have } else { 0.0 }
    }
}

/// Requires the owning node to have at least `min` neighbors.
#[derive(Debug, Clone, Copy)]
pub struct HasNeighbors {
    min: usize,
}

impl HasNeighbors {
    pub fn new(min: usize) -> HasNeighbors {
        HasNeighbors { min }
    }
}

impl Condition for HasNeighbors {
    fn reads(&self) -> Vec<Dependency> {
        vec![Dependency::Position]
    }

    fn scope(&self) -> Context {
        Context::Neighborhood
    }

    fn is_satisfied(&self, node: NodeId, env: &Environment) -> bool {
        env.neighbors_of(node).len() >= self.min
    }
}
