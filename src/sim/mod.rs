//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件，如仿真时间、事件队列、依赖图、
//! 引擎与监视器。

// 子模块声明
mod command;
mod dependency;
mod engine;
mod error;
mod monitor;
mod scheduler;
mod status;
mod time;

// 重新导出公共接口
pub use command::{EngineCommand, EngineController};
pub use dependency::DependencyGraph;
pub use engine::{Engine, EngineConfig, EngineStats, FinishReason, StepResult};
pub use error::{EnvironmentError, SimulationError};
pub use monitor::{ProgressMonitor, SimulationMonitor, TraceLogger, TraceRecord};
pub use scheduler::ReactionScheduler;
pub use status::EngineStatus;
pub use time::SimTime;
