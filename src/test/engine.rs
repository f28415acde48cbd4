use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::model::{
    Action, AdjustConcentration, ConcentrationAtLeast, Dependency, Effects, Environment,
    ExponentialRate, FixedInterval, Molecule, NodeId, NoLinks, Position, RateModel, ReactionId,
    ReactionTemplate, SetConcentration, Trigger,
};
use crate::rng::SimRng;
use crate::sim::{
    Engine, EngineCommand, EngineConfig, EngineStatus, EnvironmentError, FinishReason, SimTime,
    SimulationError, SimulationMonitor, StepResult, TraceLogger,
};

fn isolated_env() -> Environment {
    Environment::new(Box::new(NoLinks))
}

fn decay_template(molecule: &str) -> ReactionTemplate {
    ReactionTemplate {
        rate: Box::new(ExponentialRate::new(1.0)),
        conditions: vec![Box::new(ConcentrationAtLeast::new(
            Molecule::new(molecule),
            1.0,
        ))],
        actions: vec![Box::new(AdjustConcentration::new(
            Molecule::new(molecule),
            -1.0,
        ))],
    }
}

fn decay_engine(initial: f64, config: EngineConfig) -> (Engine, NodeId) {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.set_concentration(node, Molecule::new("A"), initial)
        .expect("set A");
    env.add_reaction(node, decay_template("A"))
        .expect("add reaction");
    (Engine::new(env, config), node)
}

fn drive(engine: &mut Engine) -> FinishReason {
    loop {
        match engine.step().expect("step") {
            StepResult::Fired { .. } => {}
            StepResult::Finished(reason) => return reason,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ProbeState {
    initialized: usize,
    steps: Vec<u64>,
    finished: usize,
    failed: usize,
}

/// Monitor sharing its observations with the test through a handle.
#[derive(Debug, Clone, Default)]
struct Probe {
    state: Arc<Mutex<ProbeState>>,
}

impl Probe {
    fn snapshot(&self) -> ProbeState {
        self.state.lock().expect("probe lock").clone()
    }
}

impl SimulationMonitor for Probe {
    fn on_initialized(&mut self, _env: &Environment) {
        self.state.lock().expect("probe lock").initialized += 1;
    }

    fn on_step(&mut self, _env: &Environment, _fired: ReactionId, _time: SimTime, step: u64) {
        self.state.lock().expect("probe lock").steps.push(step);
    }

    fn on_finished(&mut self, _env: &Environment, _time: SimTime, _step: u64) {
        self.state.lock().expect("probe lock").finished += 1;
    }

    fn on_failed(&mut self, _error: &SimulationError) {
        self.state.lock().expect("probe lock").failed += 1;
    }
}

/// Action that always reports a vanished node.
#[derive(Debug)]
struct AlwaysFails;

impl Action for AlwaysFails {
    fn writes(&self) -> Vec<Dependency> {
        vec![Dependency::Molecule(Molecule::new("X"))]
    }

    fn execute(
        &self,
        node: NodeId,
        _env: &mut Environment,
        _rng: &mut SimRng,
        _effects: &mut Effects,
    ) -> Result<(), SimulationError> {
        Err(EnvironmentError::UnknownNode(node).into())
    }
}

/// Rate model that schedules its second occurrence before the first.
#[derive(Debug)]
struct BackwardsRate {
    updates: usize,
}

impl RateModel for BackwardsRate {
    fn tau(&self) -> SimTime {
        if self.updates <= 1 {
            SimTime::from_secs(5.0)
        } else {
            SimTime::from_secs(1.0)
        }
    }

    fn update(&mut self, _now: SimTime, _fired: bool, _propensity: f64, _rng: &mut SimRng) {
        self.updates += 1;
    }
}

#[test]
fn initialize_then_run_reaches_terminated() {
    let (mut engine, node) = decay_engine(3.0, EngineConfig::default());
    assert_eq!(engine.status(), EngineStatus::Init);
    engine.initialize().expect("initialize");
    assert_eq!(engine.status(), EngineStatus::Ready);

    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Terminated);
    assert_eq!(engine.stats.steps, 3);
    assert_eq!(engine.stats.fired, 3);
    assert_eq!(engine.stats.skipped, 0);
    assert_eq!(
        engine.environment().concentration(node, &Molecule::new("A")),
        0.0
    );
}

#[test]
fn manual_steps_advance_time_monotonically() {
    let (mut engine, _) = decay_engine(5.0, EngineConfig::default());
    engine.initialize().expect("initialize");

    let mut last = SimTime::ZERO;
    let mut fired = 0;
    loop {
        match engine.step().expect("step") {
            StepResult::Fired { time, executed, .. } => {
                assert!(time >= last);
                assert!(executed);
                last = time;
                fired += 1;
            }
            StepResult::Finished(reason) => {
                assert_eq!(reason, FinishReason::Exhausted);
                break;
            }
        }
    }
    assert_eq!(fired, 5);
    assert_eq!(engine.current_time(), last);
    assert_eq!(engine.status(), EngineStatus::Terminated);
}

#[test]
fn run_stops_at_step_limit() {
    let (mut engine, node) = decay_engine(
        100.0,
        EngineConfig {
            max_steps: Some(10),
            ..Default::default()
        },
    );
    engine.initialize().expect("initialize");
    engine.run().expect("run");
    assert_eq!(engine.status(), EngineStatus::Terminated);
    assert_eq!(engine.stats.steps, 10);
    assert_eq!(
        engine.environment().concentration(node, &Molecule::new("A")),
        90.0
    );
}

#[test]
fn sim_time_limit_clamps_the_clock() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
            conditions: Vec::new(),
            actions: Vec::new(),
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(
        env,
        EngineConfig {
            max_sim_time: Some(SimTime::from_secs(5.5)),
            ..Default::default()
        },
    );
    engine.initialize().expect("initialize");

    let reason = drive(&mut engine);
    assert_eq!(reason, FinishReason::MaxSimTime);
    assert_eq!(engine.stats.steps, 5);
    assert_eq!(engine.current_time(), SimTime::from_secs(5.5));
}

#[test]
fn wall_clock_budget_interrupts_the_run() {
    let (mut engine, node) = decay_engine(
        100_000.0,
        EngineConfig {
            max_wall: Some(Duration::from_nanos(1)),
            ..Default::default()
        },
    );
    engine.initialize().expect("initialize");
    let reason = drive(&mut engine);
    assert_eq!(reason, FinishReason::WallClock);
    assert!(engine.stats.steps < 100_000);
    assert!(engine.environment().concentration(node, &Molecule::new("A")) > 0.0);
}

#[test]
fn unsatisfied_conditions_skip_but_keep_cadence() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
            conditions: vec![Box::new(ConcentrationAtLeast::new(Molecule::new("B"), 1.0))],
            actions: vec![Box::new(AdjustConcentration::new(Molecule::new("A"), 1.0))],
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(
        env,
        EngineConfig {
            max_steps: Some(4),
            ..Default::default()
        },
    );
    engine.initialize().expect("initialize");

    let first = engine.step().expect("step");
    assert_eq!(
        first,
        StepResult::Fired {
            reaction: ReactionId(0),
            time: SimTime::from_secs(1.0),
            executed: false,
        }
    );

    let reason = drive(&mut engine);
    assert_eq!(reason, FinishReason::MaxSteps);
    assert_eq!(engine.stats.steps, 4);
    assert_eq!(engine.stats.skipped, 4);
    assert_eq!(engine.stats.fired, 0);
    assert_eq!(engine.current_time(), SimTime::from_secs(4.0));
    assert_eq!(
        engine.environment().concentration(node, &Molecule::new("A")),
        0.0
    );
}

#[test]
fn trigger_reaction_fires_exactly_once() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(Trigger::new(SimTime::from_secs(2.0))),
            conditions: Vec::new(),
            actions: vec![Box::new(SetConcentration::new(Molecule::new("A"), 9.0))],
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    assert_eq!(drive(&mut engine), FinishReason::Exhausted);
    assert_eq!(engine.stats.fired, 1);
    assert_eq!(engine.current_time(), SimTime::from_secs(2.0));
    assert_eq!(
        engine.environment().concentration(node, &Molecule::new("A")),
        9.0
    );
}

#[test]
fn lifecycle_misuse_is_rejected() {
    let (mut engine, _) = decay_engine(1.0, EngineConfig::default());
    assert!(matches!(
        engine.step(),
        Err(SimulationError::Lifecycle { op: "step", .. })
    ));
    assert!(matches!(
        engine.run(),
        Err(SimulationError::Lifecycle { op: "run", .. })
    ));
    assert_eq!(engine.status(), EngineStatus::Init);

    engine.initialize().expect("initialize");
    assert!(matches!(
        engine.initialize(),
        Err(SimulationError::Lifecycle {
            op: "initialize",
            ..
        })
    ));
    assert_eq!(engine.status(), EngineStatus::Ready);

    engine.run().expect("run");
    assert_eq!(engine.status(), EngineStatus::Terminated);
    assert!(matches!(
        engine.step(),
        Err(SimulationError::Lifecycle { op: "step", .. })
    ));
}

#[test]
fn empty_environment_finishes_exhausted() {
    let mut engine = Engine::new(isolated_env(), EngineConfig::default());
    engine.initialize().expect("initialize");
    assert_eq!(
        engine.step().expect("step"),
        StepResult::Finished(FinishReason::Exhausted)
    );
    assert_eq!(engine.status(), EngineStatus::Terminated);
}

#[test]
fn invalid_config_is_rejected_at_initialize() {
    let (mut engine, _) = decay_engine(
        1.0,
        EngineConfig {
            max_steps: Some(0),
            ..Default::default()
        },
    );
    assert!(matches!(
        engine.initialize(),
        Err(SimulationError::Configuration(_))
    ));
    assert_eq!(engine.status(), EngineStatus::Init);

    let (mut engine, _) = decay_engine(
        1.0,
        EngineConfig {
            batch: Some(0),
            ..Default::default()
        },
    );
    assert!(matches!(
        engine.initialize(),
        Err(SimulationError::Configuration(_))
    ));

    let (mut engine, _) = decay_engine(
        1.0,
        EngineConfig {
            max_wall: Some(Duration::ZERO),
            ..Default::default()
        },
    );
    assert!(matches!(
        engine.initialize(),
        Err(SimulationError::Configuration(_))
    ));
}

#[test]
fn failing_action_moves_engine_to_error() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(Trigger::new(SimTime::from_secs(1.0))),
            conditions: Vec::new(),
            actions: vec![Box::new(AlwaysFails)],
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    let err = engine.run().expect_err("run must fail");
    assert!(matches!(
        err,
        SimulationError::Execution {
            reaction: ReactionId(0),
            ..
        }
    ));
    assert_eq!(engine.status(), EngineStatus::Error);
    assert!(engine.last_error().is_some());
    assert!(matches!(
        engine.step(),
        Err(SimulationError::Lifecycle { .. })
    ));
}

#[test]
fn regressive_rate_model_is_detected() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(BackwardsRate { updates: 0 }),
            conditions: Vec::new(),
            actions: Vec::new(),
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    assert!(matches!(
        engine.step().expect("first step"),
        StepResult::Fired { .. }
    ));
    let err = engine.step().expect_err("regression must surface");
    assert!(matches!(err, SimulationError::TimeNotMonotonic { .. }));
    assert_eq!(engine.status(), EngineStatus::Error);
}

#[test]
fn pause_command_suspends_the_run() {
    let (mut engine, _) = decay_engine(50.0, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine.controller().pause();

    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Paused);
    assert_eq!(engine.stats.steps, 0);

    // resuming drains the rest of the run
    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Terminated);
    assert_eq!(engine.stats.fired, 50);
}

#[test]
fn terminate_command_stops_before_the_next_step() {
    let (mut engine, node) = decay_engine(50.0, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine.controller().terminate();

    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Terminated);
    assert_eq!(engine.stats.steps, 0);
    assert_eq!(
        engine.environment().concentration(node, &Molecule::new("A")),
        50.0
    );
}

#[test]
fn terminate_call_finishes_a_manual_session() {
    let (mut engine, _) = decay_engine(5.0, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine.step().expect("step");

    engine.terminate();
    assert_eq!(engine.status(), EngineStatus::Terminated);
    // terminal states ignore repeated terminate calls
    engine.terminate();
    assert_eq!(engine.status(), EngineStatus::Terminated);
}

#[test]
fn add_node_command_applies_at_step_boundary() {
    let (mut engine, _) = decay_engine(5.0, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine.controller().send(EngineCommand::AddNode {
        position: Position::new(3.0, 0.0),
        molecules: vec![(Molecule::new("A"), 2.0)],
        reactions: vec![decay_template("A")],
    });

    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Terminated);
    assert_eq!(engine.environment().node_count(), 2);
    assert_eq!(engine.stats.fired, 7);
}

#[test]
fn remove_node_command_unschedules_its_reactions() {
    let mut env = isolated_env();
    let a = env.add_node(Position::ORIGIN);
    env.set_concentration(a, Molecule::new("A"), 1000.0)
        .expect("set A");
    env.add_reaction(a, decay_template("A")).expect("add reaction");
    let b = env.add_node(Position::new(5.0, 0.0));
    env.set_concentration(b, Molecule::new("A"), 2.0)
        .expect("set A");
    env.add_reaction(b, decay_template("A")).expect("add reaction");

    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine.controller().send(EngineCommand::RemoveNode(a));

    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Terminated);
    assert_eq!(engine.stats.fired, 2);
    assert!(engine.environment().node(a).is_none());
    assert_eq!(
        engine.environment().concentration(b, &Molecule::new("A")),
        0.0
    );
}

#[test]
fn inject_reaction_command_schedules_on_a_live_node() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine.controller().send(EngineCommand::InjectReaction {
        node,
        template: ReactionTemplate {
            rate: Box::new(Trigger::new(SimTime::from_secs(1.0))),
            conditions: Vec::new(),
            actions: vec![Box::new(SetConcentration::new(Molecule::new("A"), 9.0))],
        },
    });

    let status = engine.run().expect("run");
    assert_eq!(status, EngineStatus::Terminated);
    assert_eq!(engine.stats.fired, 1);
    assert_eq!(
        engine.environment().concentration(node, &Molecule::new("A")),
        9.0
    );
}

#[test]
fn structural_command_on_unknown_node_fails_the_run() {
    let (mut engine, _) = decay_engine(5.0, EngineConfig::default());
    engine.initialize().expect("initialize");
    engine
        .controller()
        .send(EngineCommand::RemoveNode(NodeId(42)));

    let err = engine.run().expect_err("unknown node must fail the run");
    assert!(matches!(
        err,
        SimulationError::Environment(EnvironmentError::UnknownNode(NodeId(42)))
    ));
    assert_eq!(engine.status(), EngineStatus::Error);
}

#[test]
fn monitors_observe_lifecycle_and_steps() {
    let (mut engine, _) = decay_engine(3.0, EngineConfig::default());
    let probe = Probe::default();
    engine.add_monitor(Box::new(probe.clone()));
    engine.initialize().expect("initialize");
    engine.run().expect("run");

    let state = probe.snapshot();
    assert_eq!(state.initialized, 1);
    assert_eq!(state.steps, vec![1, 2, 3]);
    assert_eq!(state.finished, 1);
    assert_eq!(state.failed, 0);
}

#[test]
fn monitors_observe_failures() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(Trigger::new(SimTime::from_secs(1.0))),
            conditions: Vec::new(),
            actions: vec![Box::new(AlwaysFails)],
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(env, EngineConfig::default());
    let probe = Probe::default();
    engine.add_monitor(Box::new(probe.clone()));
    engine.initialize().expect("initialize");

    let _ = engine.run().expect_err("run must fail");
    let state = probe.snapshot();
    assert_eq!(state.failed, 1);
    assert_eq!(state.finished, 0);
    assert!(state.steps.is_empty());
}

#[test]
fn trace_logger_records_fired_reactions() {
    let (mut engine, node) = decay_engine(2.0, EngineConfig::default());
    let trace = TraceLogger::new();
    engine.add_monitor(Box::new(trace.clone()));
    engine.initialize().expect("initialize");
    engine.run().expect("run");

    let records = trace.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].step, 1);
    assert_eq!(records[1].step, 2);
    assert!(records[0].t <= records[1].t);
    assert!(records.iter().all(|r| r.node == node.0 && r.reaction == 0));
}

#[test]
fn batch_window_commits_independent_heads() {
    let mut env = isolated_env();
    let a = env.add_node(Position::ORIGIN);
    let b = env.add_node(Position::new(5.0, 0.0));
    for node in [a, b] {
        env.add_reaction(
            node,
            ReactionTemplate {
                rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
                conditions: Vec::new(),
                actions: vec![Box::new(AdjustConcentration::new(Molecule::new("X"), 1.0))],
            },
        )
        .expect("add reaction");
    }
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    let result = engine.step_batch(4).expect("batch");
    assert_eq!(
        result,
        StepResult::Fired {
            reaction: ReactionId(0),
            time: SimTime::from_secs(1.0),
            executed: true,
        }
    );
    assert_eq!(engine.stats.steps, 2);
    assert_eq!(engine.stats.fired, 2);
    assert_eq!(engine.current_time(), SimTime::from_secs(1.0));
    assert_eq!(
        engine.environment().concentration(a, &Molecule::new("X")),
        1.0
    );
    assert_eq!(
        engine.environment().concentration(b, &Molecule::new("X")),
        1.0
    );
}

#[test]
fn batch_window_stops_at_first_conflict() {
    let mut env = isolated_env();
    let a = env.add_node(Position::ORIGIN);
    // two writers on one node never share a window
    for _ in 0..2 {
        env.add_reaction(
            a,
            ReactionTemplate {
                rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
                conditions: Vec::new(),
                actions: vec![Box::new(AdjustConcentration::new(Molecule::new("X"), 1.0))],
            },
        )
        .expect("add reaction");
    }
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    let result = engine.step_batch(4).expect("batch");
    assert_eq!(
        result,
        StepResult::Fired {
            reaction: ReactionId(0),
            time: SimTime::from_secs(1.0),
            executed: true,
        }
    );
    assert_eq!(engine.stats.steps, 1);
    assert_eq!(
        engine.environment().concentration(a, &Molecule::new("X")),
        1.0
    );

    // the displaced head fires in the next window, same order as
    // sequential stepping
    let result = engine.step_batch(4).expect("batch");
    assert_eq!(
        result,
        StepResult::Fired {
            reaction: ReactionId(1),
            time: SimTime::from_secs(1.0),
            executed: true,
        }
    );
    assert_eq!(engine.stats.steps, 2);
    assert_eq!(
        engine.environment().concentration(a, &Molecule::new("X")),
        2.0
    );
}

#[test]
fn batch_reschedules_land_after_the_window() {
    let mut env = isolated_env();
    let a = env.add_node(Position::ORIGIN);
    let b = env.add_node(Position::new(5.0, 0.0));
    env.add_reaction(
        a,
        ReactionTemplate {
            rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
            conditions: Vec::new(),
            actions: vec![Box::new(AdjustConcentration::new(Molecule::new("X"), 1.0))],
        },
    )
    .expect("add reaction");
    env.add_reaction(
        b,
        ReactionTemplate {
            rate: Box::new(FixedInterval::new(SimTime::from_secs(5.0))),
            conditions: Vec::new(),
            actions: vec![Box::new(AdjustConcentration::new(Molecule::new("Y"), 1.0))],
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    // the window spans t=1..5; the short-period member fires once in it
    // and its next occurrence is based at the window end, not at t=2
    let result = engine.step_batch(4).expect("batch");
    assert_eq!(
        result,
        StepResult::Fired {
            reaction: ReactionId(0),
            time: SimTime::from_secs(1.0),
            executed: true,
        }
    );
    assert_eq!(engine.stats.steps, 2);
    assert_eq!(engine.current_time(), SimTime::from_secs(5.0));
    assert_eq!(
        engine.environment().concentration(a, &Molecule::new("X")),
        1.0
    );

    let result = engine.step().expect("step");
    assert_eq!(
        result,
        StepResult::Fired {
            reaction: ReactionId(0),
            time: SimTime::from_secs(6.0),
            executed: true,
        }
    );
    assert_eq!(
        engine.environment().concentration(a, &Molecule::new("X")),
        2.0
    );
}

#[test]
fn batch_members_can_be_skipped() {
    let mut env = isolated_env();
    let node = env.add_node(Position::ORIGIN);
    env.add_reaction(
        node,
        ReactionTemplate {
            rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
            conditions: vec![Box::new(ConcentrationAtLeast::new(Molecule::new("B"), 1.0))],
            actions: vec![Box::new(AdjustConcentration::new(Molecule::new("A"), 1.0))],
        },
    )
    .expect("add reaction");
    let mut engine = Engine::new(env, EngineConfig::default());
    engine.initialize().expect("initialize");

    let result = engine.step_batch(2).expect("batch");
    assert_eq!(
        result,
        StepResult::Fired {
            reaction: ReactionId(0),
            time: SimTime::from_secs(1.0),
            executed: false,
        }
    );
    assert_eq!(engine.stats.skipped, 1);
    assert_eq!(engine.stats.fired, 0);
}

#[test]
fn batch_mode_run_honors_step_limit() {
    let mut env = isolated_env();
    let a = env.add_node(Position::ORIGIN);
    let b = env.add_node(Position::new(5.0, 0.0));
    for node in [a, b] {
        env.add_reaction(
            node,
            ReactionTemplate {
                rate: Box::new(FixedInterval::new(SimTime::from_secs(1.0))),
                conditions: Vec::new(),
                actions: vec![Box::new(AdjustConcentration::new(Molecule::new("X"), 1.0))],
            },
        )
        .expect("add reaction");
    }
    let mut engine = Engine::new(
        env,
        EngineConfig {
            batch: Some(8),
            max_steps: Some(6),
            ..Default::default()
        },
    );
    engine.initialize().expect("initialize");

    engine.run().expect("run");
    assert_eq!(engine.status(), EngineStatus::Terminated);
    assert_eq!(engine.stats.steps, 6);
    assert_eq!(
        engine.environment().concentration(a, &Molecule::new("X")),
        3.0
    );
    assert_eq!(
        engine.environment().concentration(b, &Molecule::new("X")),
        3.0
    );
}

#[test]
fn zero_batch_window_is_rejected() {
    let (mut engine, _) = decay_engine(1.0, EngineConfig::default());
    engine.initialize().expect("initialize");
    assert!(matches!(
        engine.step_batch(0),
        Err(SimulationError::Configuration(_))
    ));
    assert_eq!(engine.status(), EngineStatus::Error);
}
