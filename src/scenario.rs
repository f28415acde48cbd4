use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{
    Action, AdjustConcentration, AdjustNeighbor, ConcentrationAtLeast, Condition,
    ConnectWithinRange, Environment, ExponentialRate, FixedInterval, HasNeighbors, LinkingRule,
    Molecule, NoLinks, NodeId, Position, RandomWalk, RateModel, ReactionTemplate,
    SetConcentration, Trigger,
};
use crate::sim::{Engine, EngineConfig, SimTime, SimulationError};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    #[serde(default)]
    pub seed: Option<u64>,
    pub linking: LinkingSpec,
    #[serde(default)]
    pub termination: Option<TerminationSpec>,
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkingSpec {
    NoLinks,
    ConnectWithinRange { range: f64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminationSpec {
    #[serde(default)]
    pub max_steps: Option<u64>,
    #[serde(default)]
    pub max_sim_time_s: Option<f64>,
    #[serde(default)]
    pub max_wall_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Position as `[x, y]`.
    pub position: [f64; 2],
    /// Initial molecule concentrations, keyed by molecule name.
    #[serde(default)]
    pub molecules: BTreeMap<String, f64>,
    #[serde(default)]
    pub reactions: Vec<ReactionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionSpec {
    pub rate: RateSpec,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSpec {
    /// Markovian rate; the firing rate scales with the propensity of the
    /// reaction's conditions.
    Exponential { rate: f64 },
    /// Deterministic cadence, one occurrence every `period_s` seconds.
    FixedInterval { period_s: f64 },
    /// Fires exactly once at `at_s`.
    Trigger { at_s: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionSpec {
    MoleculeAtLeast {
        molecule: String,
        #[serde(default)]
        threshold: Option<f64>,
    },
    HasNeighbors {
        #[serde(default)]
        min: Option<usize>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    Set { molecule: String, value: f64 },
    Adjust { molecule: String, delta: f64 },
    AdjustNeighbor { molecule: String, delta: f64 },
    RandomWalk { step: f64 },
}

/// Assembles a ready-to-initialize engine from a parsed scenario.
///
/// Node ids are assigned in declaration order, reaction ids in node-major
/// declaration order, so a scenario file pins the deterministic tie-break
/// order exactly.
pub fn build_engine(spec: &ScenarioSpec) -> Result<Engine, SimulationError> {
    let env = build_environment(spec)?;
    Ok(Engine::new(env, engine_config(spec)?))
}

/// Builds just the populated environment, leaving engine configuration to
/// the caller.
pub fn build_environment(spec: &ScenarioSpec) -> Result<Environment, SimulationError> {
    if spec.schema_version != SCHEMA_VERSION {
        return Err(SimulationError::Configuration(format!(
            "unsupported schema_version {} (expected {SCHEMA_VERSION})",
            spec.schema_version
        )));
    }
    let mut env = Environment::new(build_linking(&spec.linking)?);

    let mut ids: Vec<NodeId> = Vec::with_capacity(spec.nodes.len());
    for (idx, node) in spec.nodes.iter().enumerate() {
        let [x, y] = node.position;
        if !x.is_finite() || !y.is_finite() {
            return Err(SimulationError::Configuration(format!(
                "node {idx}: position must be finite"
            )));
        }
        let id = env.add_node(Position::new(x, y));
        for (name, value) in &node.molecules {
            if !value.is_finite() || *value < 0.0 {
                return Err(SimulationError::Configuration(format!(
                    "node {idx}: concentration of {name} must be finite and non-negative"
                )));
            }
            env.set_concentration(id, Molecule::new(name.as_str()), *value)?;
        }
        ids.push(id);
    }
    for (idx, node) in spec.nodes.iter().enumerate() {
        for reaction in &node.reactions {
            env.add_reaction(ids[idx], build_template(reaction)?)?;
        }
    }

    Ok(env)
}

/// Translates one reaction spec into a runtime template.
pub fn build_template(spec: &ReactionSpec) -> Result<ReactionTemplate, SimulationError> {
    let rate: Box<dyn RateModel> = match spec.rate {
        RateSpec::Exponential { rate } => {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(SimulationError::Configuration(
                    "exponential rate must be finite and positive".into(),
                ));
            }
            Box::new(ExponentialRate::new(rate))
        }
        RateSpec::FixedInterval { period_s } => {
            if !period_s.is_finite() || period_s <= 0.0 {
                return Err(SimulationError::Configuration(
                    "fixed_interval period_s must be finite and positive".into(),
                ));
            }
            Box::new(FixedInterval::new(SimTime::from_secs(period_s)))
        }
        RateSpec::Trigger { at_s } => {
            if !at_s.is_finite() || at_s < 0.0 {
                return Err(SimulationError::Configuration(
                    "trigger at_s must be finite and non-negative".into(),
                ));
            }
            Box::new(Trigger::new(SimTime::from_secs(at_s)))
        }
    };

    let mut conditions: Vec<Box<dyn Condition>> = Vec::new();
    for condition in &spec.conditions {
        conditions.push(match condition {
            ConditionSpec::MoleculeAtLeast { molecule, threshold } => {
                let threshold = threshold.unwrap_or(1.0);
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(SimulationError::Configuration(format!(
                        "molecule_at_least threshold for {molecule} must be finite and non-negative"
                    )));
                }
                Box::new(ConcentrationAtLeast::new(
                    Molecule::new(molecule.as_str()),
                    threshold,
                ))
            }
            ConditionSpec::HasNeighbors { min } => {
                Box::new(HasNeighbors::new(min.unwrap_or(1)))
            }
        });
    }

    let mut actions: Vec<Box<dyn Action>> = Vec::new();
    for action in &spec.actions {
        actions.push(match action {
            ActionSpec::Set { molecule, value } => {
                if !value.is_finite() || *value < 0.0 {
                    return Err(SimulationError::Configuration(format!(
                        "set value for {molecule} must be finite and non-negative"
                    )));
                }
                Box::new(SetConcentration::new(Molecule::new(molecule.as_str()), *value))
            }
            ActionSpec::Adjust { molecule, delta } => {
                if !delta.is_finite() {
                    return Err(SimulationError::Configuration(format!(
                        "adjust delta for {molecule} must be finite"
                    )));
                }
                Box::new(AdjustConcentration::new(
                    Molecule::new(molecule.as_str()),
                    *delta,
                ))
            }
            ActionSpec::AdjustNeighbor { molecule, delta } => {
                if !delta.is_finite() {
                    return Err(SimulationError::Configuration(format!(
                        "adjust_neighbor delta for {molecule} must be finite"
                    )));
                }
                Box::new(AdjustNeighbor::new(Molecule::new(molecule.as_str()), *delta))
            }
            ActionSpec::RandomWalk { step } => {
                if !step.is_finite() || *step <= 0.0 {
                    return Err(SimulationError::Configuration(
                        "random_walk step must be finite and positive".into(),
                    ));
                }
                Box::new(RandomWalk::new(*step))
            }
        });
    }

    Ok(ReactionTemplate {
        rate,
        conditions,
        actions,
    })
}

fn build_linking(spec: &LinkingSpec) -> Result<Box<dyn LinkingRule>, SimulationError> {
    match *spec {
        LinkingSpec::NoLinks => Ok(Box::new(NoLinks)),
        LinkingSpec::ConnectWithinRange { range } => {
            if !range.is_finite() || range <= 0.0 {
                return Err(SimulationError::Configuration(
                    "connect_within_range range must be finite and positive".into(),
                ));
            }
            Ok(Box::new(ConnectWithinRange { range }))
        }
    }
}

/// Maps the scenario's seed and termination section onto an engine config.
pub fn engine_config(spec: &ScenarioSpec) -> Result<EngineConfig, SimulationError> {
    let mut config = EngineConfig {
        seed: spec.seed.unwrap_or(1),
        ..EngineConfig::default()
    };
    if let Some(termination) = &spec.termination {
        if termination.max_steps == Some(0) {
            return Err(SimulationError::Configuration(
                "max_steps must be positive".into(),
            ));
        }
        config.max_steps = termination.max_steps;
        if let Some(secs) = termination.max_sim_time_s {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(SimulationError::Configuration(
                    "max_sim_time_s must be finite and positive".into(),
                ));
            }
            config.max_sim_time = Some(SimTime::from_secs(secs));
        }
        config.max_wall = termination.max_wall_ms.map(Duration::from_millis);
    }
    Ok(config)
}
