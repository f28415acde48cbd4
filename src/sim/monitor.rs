//! Observation hooks.
//!
//! Monitors are notified after engine transitions. They observe the
//! environment read-only and must never steer the simulation.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::model::{Environment, ReactionId};

use super::error::SimulationError;
use super::time::SimTime;

/// Receives engine lifecycle and step notifications.
pub trait SimulationMonitor: Send {
    fn on_initialized(&mut self, _env: &Environment) {}

    /// Called after every committed step, firing and skip alike.
    fn on_step(&mut self, _env: &Environment, _fired: ReactionId, _time: SimTime, _step: u64) {}

    fn on_finished(&mut self, _env: &Environment, _time: SimTime, _step: u64) {}

    /// Called once when the engine drops into the error status.
    fn on_failed(&mut self, _error: &SimulationError) {}
}

/// Logs one progress line every `every` committed steps.
#[derive(Debug)]
pub struct ProgressMonitor {
    every: u64,
}

impl ProgressMonitor {
    pub fn new(every: u64) -> ProgressMonitor {
        ProgressMonitor {
            every: every.max(1),
        }
    }
}

impl SimulationMonitor for ProgressMonitor {
    fn on_step(&mut self, env: &Environment, _fired: ReactionId, time: SimTime, step: u64) {
        if step % self.every == 0 {
            info!(
                step,
                t = time.as_secs(),
                nodes = env.node_count(),
                reactions = env.reaction_count(),
                "progress"
            );
        }
    }
}

/// One committed step in a firing trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub step: u64,
    pub t: f64,
    pub reaction: usize,
    pub node: usize,
}

/// Collects the full firing sequence. Clones share the same buffer, so
/// a caller can keep one handle and hand another to the engine.
#[derive(Debug, Clone, Default)]
pub struct TraceLogger {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl TraceLogger {
    pub fn new() -> TraceLogger {
        TraceLogger::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().expect("trace lock").clone()
    }
}

impl SimulationMonitor for TraceLogger {
    fn on_step(&mut self, env: &Environment, fired: ReactionId, time: SimTime, step: u64) {
        let node = env
            .reaction(fired)
            .expect("fired reaction exists")
            .node();
        self.records.lock().expect("trace lock").push(TraceRecord {
            step,
            t: time.as_secs(),
            reaction: fired.0,
            node: node.0,
        });
    }
}
