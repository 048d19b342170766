//! Linear-ramp pacer

use super::{ConstantPacer, Pace, Pacer, RampPlan, StepPacer};
use crate::{Error, Result};
use std::fmt;
use std::time::Duration;

/// Linear-ramp pacer
///
/// Starts at `start` hits/s and changes the rate by `slope` hits/s every second.
/// This is a step ramp with one-second steps, delegated to a [`StepPacer`].
#[derive(Debug)]
pub struct LinearPacer {
    slope: i64,
    max: u64,
    ramp: StepPacer,
}

impl LinearPacer {
    /// Create a new linear pacer
    ///
    /// # Parameters
    /// - `start`: Initial rate (must be > 0 hits/s)
    /// - `slope`: Rate change per second (must be non-zero)
    pub fn new(start: ConstantPacer, slope: i64) -> Result<Self> {
        if start.freq() == 0 {
            return Err(Error::Config("LinearPacer start rate cannot be 0".to_string()));
        }
        if slope == 0 {
            return Err(Error::Config("LinearPacer slope cannot be 0".to_string()));
        }

        let ramp = StepPacer::new(start, slope, Duration::from_secs(1))?;
        Ok(Self { slope, max: 0, ramp })
    }

    /// Hold `stop` once the ramp crosses its rate
    pub fn with_stop(mut self, stop: ConstantPacer) -> Self {
        self.ramp = self.ramp.with_stop(stop);
        self
    }

    /// Ramp for `load_duration`, then hold the rate reached (or the stop rate)
    pub fn with_load_duration(mut self, load_duration: Duration) -> Self {
        self.ramp = self.ramp.with_load_duration(load_duration);
        self
    }

    /// Cap the total number of hits (0 = unlimited)
    pub fn with_max(mut self, max: u64) -> Self {
        self.max = max;
        self
    }

    pub fn slope(&self) -> i64 {
        self.slope
    }

    /// Compute the underlying ramp plan if no caller has done so yet
    pub fn ensure_ready(&self) -> &RampPlan {
        self.ramp.ensure_ready()
    }
}

impl Pacer for LinearPacer {
    fn pace(&self, elapsed: Duration, hits: u64) -> Pace {
        if self.max > 0 && hits >= self.max {
            return Pace::STOP;
        }

        self.ramp.pace(elapsed, hits)
    }

    fn rate(&self, elapsed: Duration) -> f64 {
        self.ramp.rate(elapsed)
    }
}

impl fmt::Display for LinearPacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Linear{{{} hits / 1s}}", self.slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacer::test_support::duration_eq;

    const MS: u64 = 1_000_000;
    const SEC: u64 = 1_000 * MS;

    #[test]
    fn test_linear_pacer_rejects_invalid_config() {
        assert!(matches!(LinearPacer::new(ConstantPacer::new(0), 1), Err(Error::Config(_))));
        assert!(matches!(LinearPacer::new(ConstantPacer::new(1), 0), Err(Error::Config(_))));
    }

    #[test]
    fn test_linear_pacer_pace() {
        // (start, slope, load_duration_ns, stop, elapsed_ns, hits, wait_ns)
        let cases: &[(u64, i64, u64, u64, u64, u64, u64)] = &[
            // slope: 1, start: 1
            (1, 1, 0, 0, 0, 0, SEC),
            (1, 1, 0, 0, SEC, 0, 0),
            (1, 1, 0, 0, 0, 1, 2 * SEC),
            (1, 1, 0, 0, SEC, 1, 500 * MS),
            (1, 1, 0, 0, SEC, 2, SEC),
            (1, 1, 0, 0, 2 * SEC, 2, 0),
            (1, 1, 0, 0, 2_500 * MS, 5, 500 * MS),
            // slope: 1, start: 5
            (5, 1, 0, 0, 0, 0, 200 * MS),
            (5, 1, 0, 0, SEC, 5, 166_666_666),
            (5, 1, 0, 0, 1_200 * MS, 5, 0),
            (5, 1, 0, 0, 2 * SEC, 6, 0),
            (5, 1, 0, 0, 2 * SEC, 7, 0),
            (5, 1, 0, 0, 2 * SEC, 11, 142_857_142),
            (5, 1, 0, 0, 2 * SEC, 12, 285_714_285),
            // slope: -1, start: 20
            (20, -1, 0, 0, 0, 0, 50 * MS),
            (20, -1, 0, 0, 1_100 * MS, 0, 0),
            (20, -1, 0, 0, 50 * MS, 1, 50 * MS),
            (20, -1, 0, 0, 50 * MS, 19, 950 * MS),
            (20, -1, 0, 0, 950 * MS, 19, 50 * MS),
            // slope: 1, stop rate
            (1, 1, 0, 20, 0, 0, SEC),
            (1, 1, 0, 5, 5 * SEC, 0, 0),
            (1, 1, 0, 5, 5 * SEC, 17, 600 * MS),
            // slope: 1, load duration
            (1, 1, 5 * SEC, 0, 0, 0, SEC),
            (1, 1, 5 * SEC, 0, 2 * SEC, 0, 0),
            (1, 1, 5 * SEC, 0, 2 * SEC, 5, SEC),
            (1, 1, 5 * SEC, 0, 5_200 * MS, 18, 466_666_666),
        ];

        for (i, &(start, slope, load, stop, elapsed, hits, wait)) in cases.iter().enumerate() {
            let p = LinearPacer::new(ConstantPacer::new(start), slope)
                .unwrap()
                .with_stop(ConstantPacer::new(stop))
                .with_load_duration(Duration::from_nanos(load));

            let pace = p.pace(Duration::from_nanos(elapsed), hits);
            assert!(
                duration_eq(pace.wait, Duration::from_nanos(wait)),
                "case {i}: {p}.pace({elapsed}ns, {hits}) = {pace:?}, expected wait {wait}ns"
            );
            assert!(!pace.stop, "case {i}: unexpected stop");
        }
    }

    #[test]
    fn test_linear_pacer_max() {
        let p = LinearPacer::new(ConstantPacer::new(1), 1).unwrap().with_max(3);
        assert_eq!(p.pace(Duration::from_secs(1), 1), Pace::after(Duration::from_millis(500)));
        assert_eq!(p.pace(Duration::from_secs(1), 3), Pace::STOP);
    }

    #[test]
    fn test_linear_pacer_rate() {
        let p = LinearPacer::new(ConstantPacer::new(1), 1)
            .unwrap()
            .with_load_duration(Duration::from_secs(5));
        assert_eq!(p.rate(Duration::ZERO), 1.0);
        assert_eq!(p.rate(Duration::from_millis(3_900)), 4.0);
        assert_eq!(p.rate(Duration::from_secs(5)), 6.0);
        assert_eq!(p.rate(Duration::from_secs(60)), 6.0);
        assert_eq!(p.ensure_ready().const_at(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_linear_pacer_display() {
        let p = LinearPacer::new(ConstantPacer::new(1), 1).unwrap();
        assert_eq!(p.to_string(), "Linear{1 hits / 1s}");
    }
}
