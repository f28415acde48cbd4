//! 引擎生命周期状态

/// 引擎状态机。
///
/// Init → Ready → Running ⇄ Paused → Terminated
///
/// 任意阶段的致命错误进入 Error；Terminated 与 Error 是终态，
/// 进入后引擎不再接受步进。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Init,
    Ready,
    Running,
    Paused,
    Terminated,
    Error,
}

impl EngineStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineStatus::Terminated | EngineStatus::Error)
    }
}
