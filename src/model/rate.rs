//! 速率模型
//!
//! 每个反应由速率模型给出下一次发生的绝对时刻。引擎只在初始化、
//! 自身发生、或依赖的状态变化之后调用 `update` 重算；其余时间
//! 调度器直接使用缓存的时刻。

use crate::rng::SimRng;
use crate::sim::SimTime;

/// 速率模型抽象。
///
/// `fired` 表示本反应就是刚被调度器取出的那个；依赖传播到的旁观
/// 反应拿到的是 `fired = false`。实现必须保证返回时刻不早于 `now`。
pub trait RateModel: std::fmt::Debug + Send {
    /// 缓存的下一次发生时刻
    fn tau(&self) -> SimTime;

    /// 重算下一次发生时刻。
    ///
    /// `propensity` 是条件聚合出的倾向系数，0 表示当前不可行。
    fn update(&mut self, now: SimTime, fired: bool, propensity: f64, rng: &mut SimRng);
}

/// 指数分布（马尔可夫）速率模型。
///
/// 有效速率 = 基础速率 × 倾向系数。倾向变化而自身未发生时不重新
/// 采样，而是按新旧速率之比缩放剩余等待时间，保持无记忆性。
#[derive(Debug)]
pub struct ExponentialRate {
    base_rate: f64,
    rate: f64,
    tau: SimTime,
}

impl ExponentialRate {
    pub fn new(base_rate: f64) -> ExponentialRate {
        debug_assert!(
            base_rate >= 0.0 && base_rate.is_finite(),
            "base rate must be a non-negative finite number, got {base_rate}"
        );
        ExponentialRate {
            base_rate,
            rate: 0.0,
            tau: SimTime::INFINITY,
        }
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }
}

impl RateModel for ExponentialRate {
    fn tau(&self) -> SimTime {
        self.tau
    }

    fn update(&mut self, now: SimTime, fired: bool, propensity: f64, rng: &mut SimRng) {
        let new_rate = self.base_rate * propensity;
        if new_rate <= 0.0 {
            self.rate = 0.0;
            self.tau = SimTime::INFINITY;
            return;
        }
        if fired || self.rate <= 0.0 || self.tau.is_infinite() {
            // 自身刚发生，或从不可行状态复活：重新采样
            self.tau = now + SimTime::from_secs(rng.next_exp(new_rate));
        } else if new_rate != self.rate {
            // 旁观状态变化：按速率比缩放剩余等待
            let residual = self.tau.saturating_sub(now);
            self.tau = now + SimTime::from_secs(residual.as_secs() * self.rate / new_rate);
        }
        self.rate = new_rate;
    }
}

/// 固定周期速率模型。
///
/// 自身每次发生（无论条件是否放行）后推进一个周期；条件不满足
/// 只会让该次发生被跳过，不影响节拍。
#[derive(Debug)]
pub struct FixedInterval {
    period: SimTime,
    tau: SimTime,
}

impl FixedInterval {
    pub fn new(period: SimTime) -> FixedInterval {
        FixedInterval {
            period,
            tau: SimTime::INFINITY,
        }
    }
}

impl RateModel for FixedInterval {
    fn tau(&self) -> SimTime {
        self.tau
    }

    fn update(&mut self, now: SimTime, fired: bool, _propensity: f64, _rng: &mut SimRng) {
        if fired || self.tau.is_infinite() {
            self.tau = now + self.period;
        }
    }
}

/// 一次性触发：在指定时刻发生一次，之后永不再发生。
#[derive(Debug)]
pub struct Trigger {
    at: SimTime,
    done: bool,
}

impl Trigger {
    pub fn new(at: SimTime) -> Trigger {
        Trigger { at, done: false }
    }
}

impl RateModel for Trigger {
    fn tau(&self) -> SimTime {
        if self.done { SimTime::INFINITY } else { self.at }
    }

    fn update(&mut self, now: SimTime, fired: bool, _propensity: f64, _rng: &mut SimRng) {
        if fired {
            self.done = true;
        } else if self.at < now {
            // 注入时刻已经过去：顺延到当前时刻，维持时间单调
            self.at = now;
        }
    }
}
