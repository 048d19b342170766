//! Step-ramp pacer
//!
//! The rate starts at `start` hits/s and changes by `step` hits/s every
//! `step_duration`. The ramp optionally ends in a constant phase, either after
//! `load_duration` or once the rate crosses the `stop` rate.

use super::{nth_period, whole_periods, ConstantPacer, Pace, Pacer, MAX_SCHEDULE_NS, NANOS_PER_SEC};
use crate::{Error, Result};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Derived ramp state, computed once per pacer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampPlan {
    const_at: Option<Duration>,
    stop: ConstantPacer,
    base_hits: u64,
}

impl RampPlan {
    /// Elapsed time at which the constant phase begins (`None` = ramp forever)
    pub fn const_at(&self) -> Option<Duration> {
        self.const_at
    }

    /// Rate held during the constant phase
    pub fn stop_rate(&self) -> u64 {
        self.stop.freq()
    }

    /// Hits issued by the time the constant phase begins
    pub fn base_hits(&self) -> u64 {
        self.base_hits
    }
}

/// Step-ramp pacer
///
/// # Example
/// ```
/// use std::time::Duration;
/// use volley_core::pacer::{ConstantPacer, Pacer, StepPacer};
///
/// // 5 hits/s, +5 hits/s every 5s, hold 25 hits/s once reached
/// let pacer = StepPacer::new(ConstantPacer::new(5), 5, Duration::from_secs(5))
///     .unwrap()
///     .with_stop(ConstantPacer::new(25));
/// assert_eq!(pacer.rate(Duration::from_secs(12)), 15.0);
/// ```
#[derive(Debug)]
pub struct StepPacer {
    start: ConstantPacer,
    step: i64,
    step_duration: Duration,
    stop: ConstantPacer,
    load_duration: Option<Duration>,
    max: u64,
    plan: OnceLock<RampPlan>,
}

impl StepPacer {
    /// Create a new step pacer
    ///
    /// # Parameters
    /// - `start`: Initial rate (must be > 0 hits/s)
    /// - `step`: Rate change applied every `step_duration` (must be non-zero)
    /// - `step_duration`: Length of each step (must be non-zero)
    pub fn new(start: ConstantPacer, step: i64, step_duration: Duration) -> Result<Self> {
        if step_duration.is_zero() {
            return Err(Error::Config("StepPacer step duration cannot be 0".to_string()));
        }
        if step == 0 {
            return Err(Error::Config("StepPacer step cannot be 0".to_string()));
        }
        if start.freq() == 0 {
            return Err(Error::Config("StepPacer start rate cannot be 0".to_string()));
        }

        Ok(Self {
            start,
            step,
            step_duration,
            stop: ConstantPacer::default(),
            load_duration: None,
            max: 0,
            plan: OnceLock::new(),
        })
    }

    /// Hold `stop` once the ramp crosses its rate
    ///
    /// Ignored as a trigger when a load duration is set; the load duration then
    /// decides when the constant phase begins and `stop` is the rate held.
    pub fn with_stop(mut self, stop: ConstantPacer) -> Self {
        self.stop = stop;
        self.plan = OnceLock::new();
        self
    }

    /// Ramp for `load_duration`, then hold the rate reached (or the stop rate)
    pub fn with_load_duration(mut self, load_duration: Duration) -> Self {
        self.load_duration = Some(load_duration).filter(|d| !d.is_zero());
        self.plan = OnceLock::new();
        self
    }

    /// Cap the total number of hits (0 = unlimited)
    pub fn with_max(mut self, max: u64) -> Self {
        self.max = max;
        self
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    /// Compute the ramp plan if no caller has done so yet
    ///
    /// The plan is computed exactly once even when many threads race on the first
    /// `pace` call; every caller returns with the same published plan.
    pub fn ensure_ready(&self) -> &RampPlan {
        self.plan.get_or_init(|| self.compute_plan())
    }

    fn compute_plan(&self) -> RampPlan {
        let mut stop = self.stop;

        let const_at = if let Some(load_duration) = self.load_duration {
            if stop.freq() == 0 {
                let steps = whole_periods(load_duration, self.step_duration);
                stop = ConstantPacer::new(self.shifted_freq(steps));
            }
            Some(load_duration)
        } else if stop.freq() > 0 {
            self.find_crossing(stop.freq())
        } else {
            None
        };

        let mut plan = RampPlan { const_at, stop, base_hits: 0 };
        if let Some(const_at) = const_at {
            plan.base_hits = self.hits(&plan, const_at) as u64;
        }

        tracing::debug!(
            "{} plan: const_at={:?} stop={} base_hits={}",
            self,
            plan.const_at,
            plan.stop.freq(),
            plan.base_hits
        );
        plan
    }

    /// `start + step * steps`, saturating at zero and `u64::MAX`
    fn shifted_freq(&self, steps: u64) -> u64 {
        let freq = i128::from(self.start.freq()) + i128::from(self.step) * i128::from(steps);
        u64::try_from(freq.max(0)).unwrap_or(u64::MAX)
    }

    /// First step boundary where the ramp rate crosses `stop_freq`
    ///
    /// Rising ramps cross when the rate exceeds `stop_freq`, falling ramps when it
    /// drops below. The crossing is at most `|stop - start| / |step| + 1` steps away;
    /// a crossing at `t = 0` means the ramp never enters a constant phase.
    fn find_crossing(&self, stop_freq: u64) -> Option<Duration> {
        let target = stop_freq as f64;
        let bound = stop_freq.abs_diff(self.start.freq()) / self.step.unsigned_abs() + 1;

        for i in 0..=bound {
            let t = nth_period(self.step_duration, i);
            let rate = self.ramp_rate(t);
            let crossed = if self.step > 0 { rate > target } else { rate < target };
            if crossed {
                return Some(t).filter(|t| !t.is_zero());
            }
        }

        // Integer rates always cross within `bound`. Only f64 rounding of rates
        // beyond 2^53 hits/s can hide the crossing and land here.
        tracing::warn!(
            "{} never crosses stop rate {} within {} steps, ramping without a constant phase",
            self,
            stop_freq,
            bound
        );
        None
    }

    /// Ramp rate ignoring the constant phase, clamped at 0
    fn ramp_rate(&self, elapsed: Duration) -> f64 {
        let steps = whole_periods(elapsed, self.step_duration);
        let rate = self.start.freq() as f64 + self.step as f64 * steps as f64;
        rate.max(0.0)
    }

    fn rate_with(&self, plan: &RampPlan, elapsed: Duration) -> f64 {
        match plan.const_at {
            Some(const_at) if elapsed >= const_at => plan.stop.freq() as f64,
            _ => self.ramp_rate(elapsed),
        }
    }

    /// Cumulative hits the schedule expects by time `t`
    ///
    /// Integral of the step rate function: the first step at the start rate, every
    /// full intermediate step at its own rate, then the partial current step.
    fn hits(&self, plan: &RampPlan, t: Duration) -> f64 {
        let steps = whole_periods(t, self.step_duration);
        let step_secs = self.step_duration.as_secs_f64();
        let base = self.start.freq() as f64;

        if steps == 0 {
            return t.as_secs_f64() * base;
        }

        let mut total = step_secs * base;
        for i in 1..steps {
            total += self.rate_with(plan, nth_period(self.step_duration, i)) * step_secs;
        }

        let partial = t.saturating_sub(nth_period(self.step_duration, steps));
        total + partial.as_secs_f64() * self.rate_with(plan, t)
    }
}

impl Pacer for StepPacer {
    fn pace(&self, elapsed: Duration, hits: u64) -> Pace {
        if self.max > 0 && hits >= self.max {
            return Pace::STOP;
        }

        let plan = self.ensure_ready();

        let expected_hits = self.hits(plan, elapsed);
        if hits < expected_hits as u64 {
            // Running behind, send next hit immediately
            return Pace::NOW;
        }

        if let Some(const_at) = plan.const_at {
            if elapsed >= const_at {
                if plan.stop.freq() == 0 {
                    return Pace::STOP;
                }
                return plan.stop.pace(elapsed - const_at, hits.saturating_sub(plan.base_hits));
            }
        }

        let rate = self.rate_with(plan, elapsed);
        if rate <= 0.0 {
            // Ramped down to nothing, the next hit is never due
            return Pace::STOP;
        }

        let interval = NANOS_PER_SEC as f64 / rate;
        let interval_ns = interval as u64;
        if interval_ns != 0 && MAX_SCHEDULE_NS / interval_ns < hits {
            return Pace::STOP;
        }

        let delta = hits.saturating_add(1) as f64 - expected_hits;
        Pace::after(Duration::from_nanos((interval * delta) as u64))
    }

    fn rate(&self, elapsed: Duration) -> f64 {
        self.rate_with(self.ensure_ready(), elapsed)
    }
}

impl fmt::Display for StepPacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step{{Step: {} hits / {}}}",
            self.step,
            humantime::format_duration(self.step_duration)
        )
    }
}
