//! Error taxonomy for building and running simulations.

use thiserror::Error;

use crate::model::{NodeId, ReactionId};

use super::status::EngineStatus;
use super::time::SimTime;

/// Structural faults raised by environment operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("unknown reaction {0:?}")]
    UnknownReaction(ReactionId),
}

/// Fatal simulation faults.
///
/// Any of these moves the engine into the `Error` status; the run
/// cannot be resumed afterwards.
#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    /// Rejected before the run starts: malformed scenario, invalid
    /// rates, inconsistent termination settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model contradicts itself, e.g. a reaction whose declared
    /// influence cannot reach what it writes.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A reaction action failed mid-run.
    #[error("reaction {reaction:?} on node {node:?} failed: {reason}")]
    Execution {
        reaction: ReactionId,
        node: NodeId,
        reason: String,
    },

    /// Structural fault escalated from the environment.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// The scheduler produced an occurrence behind current time.
    /// Always a defect in a rate model, never recoverable.
    #[error("time went backwards: reaction {reaction:?} fires at {at:?} but engine is at {now:?}")]
    TimeNotMonotonic {
        reaction: ReactionId,
        at: SimTime,
        now: SimTime,
    },

    /// An operation was invoked in a lifecycle status that does not
    /// permit it.
    #[error("cannot {op} while engine status is {status:?}")]
    Lifecycle {
        status: EngineStatus,
        op: &'static str,
    },
}
