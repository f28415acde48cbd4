//! Control surface shared between a running engine and the outside.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::model::{Concentration, Molecule, NodeId, Position, ReactionTemplate};

/// Instruction delivered to the engine at the next step boundary.
///
/// Structural edits are applied atomically between steps; they never
/// interleave with a firing.
#[derive(Debug)]
pub enum EngineCommand {
    Play,
    Pause,
    Terminate,
    AddNode {
        position: Position,
        molecules: Vec<(Molecule, Concentration)>,
        reactions: Vec<ReactionTemplate>,
    },
    RemoveNode(NodeId),
    InjectReaction {
        node: NodeId,
        template: ReactionTemplate,
    },
}

/// Cloneable handle feeding commands to an engine, possibly from
/// another thread. The queue is drained at step boundaries only.
#[derive(Debug, Clone, Default)]
pub struct EngineController {
    queue: Arc<Mutex<VecDeque<EngineCommand>>>,
}

impl EngineController {
    pub fn new() -> EngineController {
        EngineController::default()
    }

    pub fn send(&self, command: EngineCommand) {
        self.queue
            .lock()
            .expect("command queue lock")
            .push_back(command);
    }

    pub fn play(&self) {
        self.send(EngineCommand::Play);
    }

    pub fn pause(&self) {
        self.send(EngineCommand::Pause);
    }

    pub fn terminate(&self) {
        self.send(EngineCommand::Terminate);
    }

    pub(crate) fn drain(&self) -> Vec<EngineCommand> {
        let mut queue = self.queue.lock().expect("command queue lock");
        queue.drain(..).collect()
    }
}
