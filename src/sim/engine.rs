//! 仿真引擎
//!
//! 驱动 取最早反应 → 执行 → 依赖传播 的主循环，维护生命周期状态机
//! Init → Ready → Running ⇄ Paused → Terminated，致命错误进入
//! Error 终态。外部命令只在步进边界生效，保证每一步观察到的环境
//! 都是完整一致的。

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::model::{Effects, Environment, NodeId, ReactionId};
use crate::rng::SimRng;

use super::command::{EngineCommand, EngineController};
use super::dependency::DependencyGraph;
use super::error::{EnvironmentError, SimulationError};
use super::monitor::SimulationMonitor;
use super::scheduler::ReactionScheduler;
use super::status::EngineStatus;
use super::time::SimTime;

/// 终止条件与随机种子。
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 最多提交多少步
    pub max_steps: Option<u64>,
    /// 仿真时间上限，到达即正常终止
    pub max_sim_time: Option<SimTime>,
    /// 墙钟预算
    pub max_wall: Option<Duration>,
    /// 随机种子
    pub seed: u64,
    /// 每个提交窗口的最大无冲突发生数；None 为纯顺序
    pub batch: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_steps: None,
            max_sim_time: None,
            max_wall: None,
            seed: 1,
            batch: None,
        }
    }
}

/// 运行计数。
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    /// 已提交的步数（含跳过）
    pub steps: u64,
    /// 实际执行了动作的发生数
    pub fired: u64,
    /// 条件不放行而被跳过的发生数
    pub skipped: u64,
}

/// 一次步进的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// 提交了一次发生；`executed` 为假表示条件不放行、该次被跳过
    Fired {
        reaction: ReactionId,
        time: SimTime,
        executed: bool,
    },
    /// 运行按给定原因收束
    Finished(FinishReason),
}

/// 正常终止的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// 没有任何可发生的反应
    Exhausted,
    /// 达到步数上限
    MaxSteps,
    /// 达到仿真时间上限
    MaxSimTime,
    /// 墙钟预算用完
    WallClock,
    /// 外部命令要求终止
    Stopped,
}

enum ControlSignal {
    Continue,
    Pause,
    Terminate,
}

/// 多智能体仿真引擎。
pub struct Engine {
    env: Environment,
    scheduler: ReactionScheduler,
    deps: DependencyGraph,
    rng: SimRng,
    time: SimTime,
    status: EngineStatus,
    config: EngineConfig,
    monitors: Vec<Box<dyn SimulationMonitor>>,
    controller: EngineController,
    started: Option<Instant>,
    error: Option<SimulationError>,
    pub stats: EngineStats,
}

impl Engine {
    pub fn new(env: Environment, config: EngineConfig) -> Engine {
        let rng = SimRng::new(config.seed);
        Engine {
            env,
            scheduler: ReactionScheduler::new(),
            deps: DependencyGraph::new(),
            rng,
            time: SimTime::ZERO,
            status: EngineStatus::Init,
            config,
            monitors: Vec::new(),
            controller: EngineController::new(),
            started: None,
            error: None,
            stats: EngineStats::default(),
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// 当前仿真时刻
    pub fn current_time(&self) -> SimTime {
        self.time
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// 进入 Error 态的原因
    pub fn last_error(&self) -> Option<&SimulationError> {
        self.error.as_ref()
    }

    /// 可跨线程下发命令的控制句柄
    pub fn controller(&self) -> EngineController {
        self.controller.clone()
    }

    pub fn add_monitor(&mut self, monitor: Box<dyn SimulationMonitor>) {
        self.monitors.push(monitor);
    }

    /// 校验模型并为所有反应播种首次发生时刻。Init → Ready。
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.status != EngineStatus::Init {
            return Err(SimulationError::Lifecycle {
                status: self.status,
                op: "initialize",
            });
        }
        self.validate_config()?;

        let ids: Vec<ReactionId> = self.env.reaction_ids().collect();
        for rid in &ids {
            let influence = self
                .env
                .reaction(*rid)
                .expect("registered reaction exists")
                .influence();
            self.deps.check_declared(*rid, &influence)?;
        }
        for rid in ids {
            self.deps.reaction_added(&self.env, rid);
            self.seed_reaction(rid)?;
        }

        for m in &mut self.monitors {
            m.on_initialized(&self.env);
        }
        self.status = EngineStatus::Ready;
        info!(
            nodes = self.env.node_count(),
            reactions = self.env.reaction_count(),
            "✅ 初始化完成"
        );
        Ok(())
    }

    /// 推进一步。允许在 Ready / Running / Paused 状态下手动调用。
    pub fn step(&mut self) -> Result<StepResult, SimulationError> {
        self.ensure_steppable("step")?;
        match self.step_inner() {
            Ok(StepResult::Finished(reason)) => {
                self.finish(reason);
                Ok(StepResult::Finished(reason))
            }
            Ok(result) => Ok(result),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// 在一个提交窗口内提交至多 `window` 个两两无依赖交叠的发生。
    ///
    /// 窗口是事件队列里按 (时刻, id) 排序的最长无冲突前缀，成员按
    /// 该顺序落地；全部重算以窗口末时刻为基准，成员的下一次发生
    /// 一律排在窗口之后，不会插回窗口之内。返回值报告窗口内最早
    /// 的那次发生。
    pub fn step_batch(&mut self, window: usize) -> Result<StepResult, SimulationError> {
        self.ensure_steppable("step_batch")?;
        if window == 0 {
            return Err(self.fail(SimulationError::Configuration(
                "batch window must be positive".into(),
            )));
        }
        match self.step_batch_inner(window) {
            Ok(StepResult::Finished(reason)) => {
                self.finish(reason);
                Ok(StepResult::Finished(reason))
            }
            Ok(result) => Ok(result),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// 持续步进直到终止、暂停或出错。
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) -> Result<EngineStatus, SimulationError> {
        self.ensure_steppable("run")?;
        self.status = EngineStatus::Running;
        info!(
            t = self.time.as_secs(),
            pending = self.scheduler.len(),
            "▶️ 开始运行仿真"
        );

        loop {
            match self.apply_pending_commands() {
                Ok(ControlSignal::Continue) => {}
                Ok(ControlSignal::Pause) => {
                    self.status = EngineStatus::Paused;
                    info!(t = self.time.as_secs(), step = self.stats.steps, "⏸️ 已暂停");
                    return Ok(self.status);
                }
                Ok(ControlSignal::Terminate) => {
                    self.finish(FinishReason::Stopped);
                    return Ok(self.status);
                }
                Err(e) => return Err(self.fail(e)),
            }

            let outcome = match self.config.batch {
                Some(window) if window > 1 => self.step_batch_inner(window),
                _ => self.step_inner(),
            };
            match outcome {
                Ok(StepResult::Fired { .. }) => {}
                Ok(StepResult::Finished(reason)) => {
                    self.finish(reason);
                    return Ok(self.status);
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    /// 立即终止（手动步进模式下使用）。
    pub fn terminate(&mut self) {
        if !self.status.is_terminal() {
            self.finish(FinishReason::Stopped);
        }
    }

    fn ensure_steppable(&self, op: &'static str) -> Result<(), SimulationError> {
        match self.status {
            EngineStatus::Ready | EngineStatus::Running | EngineStatus::Paused => Ok(()),
            status => Err(SimulationError::Lifecycle { status, op }),
        }
    }

    fn validate_config(&self) -> Result<(), SimulationError> {
        if self.config.max_steps == Some(0) {
            return Err(SimulationError::Configuration(
                "max_steps must be positive".into(),
            ));
        }
        if self.config.batch == Some(0) {
            return Err(SimulationError::Configuration(
                "batch window must be positive".into(),
            ));
        }
        if let Some(wall) = self.config.max_wall {
            if wall.is_zero() {
                return Err(SimulationError::Configuration(
                    "wall clock budget must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    // 注册反应的首次调度
    fn seed_reaction(&mut self, rid: ReactionId) -> Result<(), SimulationError> {
        let mut reaction = self
            .env
            .take_reaction(rid)
            .ok_or(EnvironmentError::UnknownReaction(rid))?;
        reaction.update(self.time, false, &self.env, &mut self.rng);
        let at = reaction.next_occurrence();
        self.env.put_reaction(rid, reaction);
        self.scheduler.insert(rid, at);
        Ok(())
    }

    fn step_inner(&mut self) -> Result<StepResult, SimulationError> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(max_steps) = self.config.max_steps {
            if self.stats.steps >= max_steps {
                return Ok(StepResult::Finished(FinishReason::MaxSteps));
            }
        }
        if let Some(budget) = self.config.max_wall {
            if started.elapsed() >= budget {
                return Ok(StepResult::Finished(FinishReason::WallClock));
            }
        }

        let Some((at, rid)) = self.scheduler.peek() else {
            return Ok(StepResult::Finished(FinishReason::Exhausted));
        };
        if at.is_infinite() {
            return Ok(StepResult::Finished(FinishReason::Exhausted));
        }
        if let Some(limit) = self.config.max_sim_time {
            if at > limit {
                // 时钟推到上限再收束，外部读到的最终时刻即上限
                self.time = limit;
                return Ok(StepResult::Finished(FinishReason::MaxSimTime));
            }
        }
        if at < self.time {
            return Err(SimulationError::TimeNotMonotonic {
                reaction: rid,
                at,
                now: self.time,
            });
        }
        self.time = at;

        let executed = self.commit(rid)?;
        Ok(StepResult::Fired {
            reaction: rid,
            time: at,
            executed,
        })
    }

    // 批量提交是一个逻辑步：成员两两无依赖交叠，动作全部落地之后
    // 才做一次合并的依赖重算，全部重算以窗口末时刻为基准。
    fn step_batch_inner(&mut self, window: usize) -> Result<StepResult, SimulationError> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(budget) = self.config.max_wall {
            if started.elapsed() >= budget {
                return Ok(StepResult::Finished(FinishReason::WallClock));
            }
        }

        // 收集窗口：依 (时刻, id) 顺序从队首取，遇到与已选成员
        // 冲突的反应即停，窗口因而是事件队列的一段前缀
        let mut accepted: Vec<(SimTime, ReactionId)> = Vec::new();
        while accepted.len() < window {
            let Some((at, rid)) = self.scheduler.peek() else {
                break;
            };
            if at.is_infinite() {
                break;
            }
            if let Some(limit) = self.config.max_sim_time {
                if at > limit {
                    break;
                }
            }
            if let Some(max_steps) = self.config.max_steps {
                if self.stats.steps + accepted.len() as u64 >= max_steps {
                    break;
                }
            }
            if at < self.time {
                return Err(SimulationError::TimeNotMonotonic {
                    reaction: rid,
                    at,
                    now: self.time,
                });
            }
            if accepted
                .iter()
                .any(|&(_, member)| self.deps.conflicts(member, rid, &self.env))
            {
                break;
            }
            self.scheduler.remove(rid);
            accepted.push((at, rid));
        }

        if accepted.is_empty() {
            // 一个都收不进来只可能是队列收束或限额；交给单步路径定性
            return self.step_inner();
        }

        // 先提交全部成员的动作。成员间写集与读写集不相交，提交顺序
        // 不影响彼此的条件判定与执行结果。
        let mut committed: Vec<(SimTime, ReactionId, bool, Effects)> = Vec::new();
        for &(at, rid) in &accepted {
            let reaction = self.env.take_reaction(rid).expect("batch member exists");
            let executed = reaction.can_execute(&self.env);
            let result = if executed {
                reaction.execute(&mut self.env, &mut self.rng)
            } else {
                Ok(Effects::default())
            };
            self.env.put_reaction(rid, reaction);
            committed.push((at, rid, executed, result?));
        }

        // 时钟推到窗口内最晚的发生时刻；此后所有重算都以它为基准，
        // 产生的新时刻不会早于当前时钟
        let (last_at, _) = *accepted.last().expect("non-empty batch");
        self.time = last_at;

        let mut affected: Vec<ReactionId> = Vec::new();
        for (_, rid, executed, effects) in &committed {
            affected.push(*rid);
            if *executed {
                affected.extend(self.deps.affected_by(*rid, effects, &self.env)?);
            }
        }
        affected.sort_unstable();
        affected.dedup();

        for dep in affected {
            let fired = accepted.iter().any(|&(_, member)| member == dep);
            let mut r = self
                .env
                .take_reaction(dep)
                .expect("affected reaction exists");
            r.update(self.time, fired, &self.env, &mut self.rng);
            let at = r.next_occurrence();
            self.env.put_reaction(dep, r);
            // 成员在收集阶段已出队，其余受影响反应仍在队列里
            if self.scheduler.time_of(dep).is_some() {
                self.scheduler.update_key(dep, at);
            } else {
                self.scheduler.insert(dep, at);
            }
        }

        for (at, rid, executed, _) in &committed {
            self.stats.steps += 1;
            if *executed {
                self.stats.fired += 1;
            } else {
                self.stats.skipped += 1;
            }
            let step = self.stats.steps;
            for m in &mut self.monitors {
                m.on_step(&self.env, *rid, *at, step);
            }
        }
        debug!(
            window = accepted.len(),
            t = self.time.as_secs(),
            "批量窗口已提交"
        );

        let (first_at, first_rid) = accepted[0];
        let first_executed = committed[0].2;
        Ok(StepResult::Fired {
            reaction: first_rid,
            time: first_at,
            executed: first_executed,
        })
    }

    // 提交单个反应：执行、传播依赖、计数、通知监视器。
    // 调用前时钟已推进到发生时刻，反应必须在调度器里。
    fn commit(&mut self, rid: ReactionId) -> Result<bool, SimulationError> {
        let reaction = self
            .env
            .take_reaction(rid)
            .expect("scheduled reaction exists");
        let executed = reaction.can_execute(&self.env);
        let result = if executed {
            reaction.execute(&mut self.env, &mut self.rng)
        } else {
            Ok(Effects::default())
        };
        self.env.put_reaction(rid, reaction);
        let effects = result?;

        // 跳过的发生没有写入任何东西，只有自身需要重新定时
        let affected = if executed {
            self.deps.affected_by(rid, &effects, &self.env)?
        } else {
            vec![rid]
        };
        for dep in affected {
            let mut r = self
                .env
                .take_reaction(dep)
                .expect("affected reaction exists");
            r.update(self.time, dep == rid, &self.env, &mut self.rng);
            let at = r.next_occurrence();
            self.env.put_reaction(dep, r);
            self.scheduler.update_key(dep, at);
        }

        self.stats.steps += 1;
        if executed {
            self.stats.fired += 1;
        } else {
            self.stats.skipped += 1;
        }
        debug!(
            step = self.stats.steps,
            t = self.time.as_secs(),
            reaction = rid.0,
            executed,
            "步进完成"
        );
        let (time, step) = (self.time, self.stats.steps);
        for m in &mut self.monitors {
            m.on_step(&self.env, rid, time, step);
        }
        Ok(executed)
    }

    // 步进边界处理外部命令；结构性编辑立即生效。
    // Terminate 优先，其后排队的命令被丢弃。
    fn apply_pending_commands(&mut self) -> Result<ControlSignal, SimulationError> {
        let mut signal = ControlSignal::Continue;
        for command in self.controller.drain() {
            match command {
                EngineCommand::Play => signal = ControlSignal::Continue,
                EngineCommand::Pause => signal = ControlSignal::Pause,
                EngineCommand::Terminate => return Ok(ControlSignal::Terminate),
                structural => self.apply_structural(structural)?,
            }
        }
        Ok(signal)
    }

    fn apply_structural(&mut self, command: EngineCommand) -> Result<(), SimulationError> {
        match command {
            EngineCommand::AddNode {
                position,
                molecules,
                reactions,
            } => {
                let node = self.env.add_node(position);
                for (molecule, value) in molecules {
                    self.env.set_concentration(node, molecule, value)?;
                }
                let mut fresh = Vec::new();
                for template in reactions {
                    let rid = self.env.add_reaction(node, template)?;
                    let influence = self
                        .env
                        .reaction(rid)
                        .expect("registered reaction exists")
                        .influence();
                    self.deps.check_declared(rid, &influence)?;
                    self.deps.reaction_added(&self.env, rid);
                    fresh.push(rid);
                }
                for rid in fresh {
                    self.seed_reaction(rid)?;
                }
                self.refresh_structural_readers(&[node]);
                info!(node = node.0, "🧩 结构命令：新增节点");
            }
            EngineCommand::RemoveNode(node) => {
                let bystanders: Vec<NodeId> =
                    self.env.neighbors_of(node).iter().copied().collect();
                let removed = self.env.remove_node(node)?;
                for rid in removed {
                    self.scheduler.remove(rid);
                    self.deps.reaction_removed(rid, node);
                }
                self.refresh_structural_readers(&bystanders);
                info!(node = node.0, "🧩 结构命令：移除节点");
            }
            EngineCommand::InjectReaction { node, template } => {
                let rid = self.env.add_reaction(node, template)?;
                let influence = self
                    .env
                    .reaction(rid)
                    .expect("registered reaction exists")
                    .influence();
                self.deps.check_declared(rid, &influence)?;
                self.deps.reaction_added(&self.env, rid);
                self.seed_reaction(rid)?;
                info!(node = node.0, reaction = rid.0, "🧩 结构命令：注入反应");
            }
            EngineCommand::Play | EngineCommand::Pause | EngineCommand::Terminate => {}
        }
        Ok(())
    }

    // 结构变化后重算周边旁观反应的时刻：拓扑或邻域内容变了，
    // 位置读者与全局读者的倾向可能随之改变
    fn refresh_structural_readers(&mut self, around: &[NodeId]) {
        if around.is_empty() && self.deps.global_readers().is_empty() {
            return;
        }
        let mut touched: Vec<ReactionId> = Vec::new();
        for (node, _) in self.env.nodes_within_hops(around, 2) {
            touched.extend_from_slice(self.env.node(node).expect("scanned node exists").reactions());
        }
        touched.extend_from_slice(self.deps.global_readers());
        touched.sort_unstable();
        touched.dedup();
        for rid in touched {
            if self.scheduler.time_of(rid).is_none() {
                continue;
            }
            let Some(mut reaction) = self.env.take_reaction(rid) else {
                continue;
            };
            reaction.update(self.time, false, &self.env, &mut self.rng);
            let at = reaction.next_occurrence();
            self.env.put_reaction(rid, reaction);
            self.scheduler.update_key(rid, at);
        }
    }

    fn finish(&mut self, reason: FinishReason) {
        self.status = EngineStatus::Terminated;
        let (time, steps) = (self.time, self.stats.steps);
        for m in &mut self.monitors {
            m.on_finished(&self.env, time, steps);
        }
        info!(
            reason = ?reason,
            t = time.as_secs(),
            steps,
            fired = self.stats.fired,
            skipped = self.stats.skipped,
            "✅ 仿真结束"
        );
    }

    fn fail(&mut self, error: SimulationError) -> SimulationError {
        warn!(error = %error, "❌ 仿真失败");
        self.status = EngineStatus::Error;
        for m in &mut self.monitors {
            m.on_failed(&error);
        }
        self.error = Some(error.clone());
        error
    }
}
