//! Constant-rate pacer

use super::{Pace, Pacer, MAX_SCHEDULE_NS, NANOS_PER_SEC};
use std::fmt;
use std::time::Duration;

/// Constant-rate pacer (fixed hits per second)
///
/// Hit `n` (0-indexed) is scheduled at `(n + 1) / freq` seconds. A pacer that is
/// behind schedule asks for the next hit immediately so it can catch up.
///
/// A frequency of 0 means unlimited rate: every `pace` call returns "send now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstantPacer {
    freq: u64,
    max: u64,
}

impl ConstantPacer {
    /// Create a new constant pacer
    ///
    /// # Parameters
    /// - `freq`: Hits per second (0 = unlimited)
    pub const fn new(freq: u64) -> Self {
        Self { freq, max: 0 }
    }

    /// Cap the total number of hits (0 = unlimited)
    pub const fn with_max(mut self, max: u64) -> Self {
        self.max = max;
        self
    }

    /// Get the frequency in hits per second
    pub fn freq(&self) -> u64 {
        self.freq
    }

    /// Get the hit cap (0 = unlimited)
    pub fn max(&self) -> u64 {
        self.max
    }
}

impl Pacer for ConstantPacer {
    fn pace(&self, elapsed: Duration, hits: u64) -> Pace {
        if self.max > 0 && hits >= self.max {
            return Pace::STOP;
        }

        if self.freq == 0 {
            return Pace::NOW;
        }

        let expected_hits = self.freq.saturating_mul(elapsed.as_secs());
        if hits < expected_hits {
            // Running behind, send next hit immediately
            return Pace::NOW;
        }

        let interval = NANOS_PER_SEC / self.freq;
        if interval > 0 && MAX_SCHEDULE_NS / interval < hits {
            // Next hit would land past the representable schedule range
            return Pace::STOP;
        }

        let next_hit = Duration::from_nanos(hits.saturating_add(1) * interval);
        Pace::after(next_hit.saturating_sub(elapsed))
    }

    fn rate(&self, _elapsed: Duration) -> f64 {
        self.freq as f64
    }
}

impl fmt::Display for ConstantPacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constant{{{} hits / 1s}}", self.freq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacer::test_support::float_eq;

    const MS: u64 = 1_000_000;

    #[test]
    fn test_constant_pacer_pace() {
        // (freq, max, elapsed_ns, hits, wait_ns, stop)
        let cases: &[(u64, u64, u64, u64, u64, bool)] = &[
            // 1 hit/sec, 0 hits sent, 0s elapsed => 1s until next hit
            (1, 0, 0, 0, 1_000 * MS, false),
            // 1 hit/sec, 0 hits sent, 0.1s elapsed => 0.9s until next hit
            (1, 0, 100 * MS, 0, 900 * MS, false),
            // 1 hit/sec, 0 hits sent, 1s elapsed => behind, send now
            (1, 0, 1_000 * MS, 0, 0, false),
            // 1 hit/sec, 0 hits sent, 2s elapsed => behind, send now
            (1, 0, 2_000 * MS, 0, 0, false),
            // 1 hit/sec, 1 hit sent, 1s elapsed => 1s until next hit
            (1, 0, 1_000 * MS, 1, 1_000 * MS, false),
            // 1 hit/sec, 2 hits sent, 1s elapsed => 2s until next hit
            (1, 0, 1_000 * MS, 2, 2_000 * MS, false),
            // 1 hit/sec, 10 hits sent, 1s elapsed => 10s until next hit
            (1, 0, 1_000 * MS, 10, 10_000 * MS, false),
            // 1 hit/sec, 10 hits sent, 11s elapsed => behind, send now
            (1, 0, 11_000 * MS, 10, 0, false),
            // 2 hits/sec, 9 hits sent, 4.9s elapsed => 100ms until next hit
            (2, 0, 4_900 * MS, 9, 100 * MS, false),
            // Zero frequency is unlimited rate
            (0, 0, 0, 0, 0, false),
            // Huge elapsed keeps the pacer behind schedule
            (1, 0, i64::MAX as u64, 2_562_048, 0, false),
            // Max not configured
            (1, 0, 1_000 * MS, 10, 10_000 * MS, false),
            // Max reached
            (1, 7, 1_000 * MS, 10, 0, true),
        ];

        for &(freq, max, elapsed, hits, wait, stop) in cases {
            let pacer = ConstantPacer::new(freq).with_max(max);
            let pace = pacer.pace(Duration::from_nanos(elapsed), hits);
            assert_eq!(
                pace,
                Pace { wait: Duration::from_nanos(wait), stop },
                "{pacer}.pace({elapsed}ns, {hits})"
            );
        }
    }

    #[test]
    fn test_constant_pacer_overflow_stops() {
        // 1 hit/sec: the hit after i64::MAX / 1e9 seconds cannot be scheduled
        let pacer = ConstantPacer::new(1);
        let hits = MAX_SCHEDULE_NS / NANOS_PER_SEC + 1;
        assert_eq!(pacer.pace(Duration::ZERO, hits), Pace::STOP);
        assert!(!pacer.pace(Duration::ZERO, hits - 1).stop);
    }

    #[test]
    fn test_constant_pacer_sub_nanosecond_interval() {
        // Faster than 1 hit/ns degenerates to "send now" instead of dividing by zero
        let pacer = ConstantPacer::new(2 * NANOS_PER_SEC);
        assert_eq!(pacer.pace(Duration::ZERO, 1_000), Pace::NOW);
        assert_eq!(pacer.pace(Duration::ZERO, u64::MAX), Pace::NOW);
        assert_eq!(pacer.pace(Duration::from_secs(5), u64::MAX), Pace::NOW);
    }

    #[test]
    fn test_constant_pacer_behind_schedule_property() {
        for freq in [1u64, 3, 10, 250] {
            let pacer = ConstantPacer::new(freq);
            for secs in 0..6u64 {
                let elapsed = Duration::from_millis(secs * 1_000 + 123);
                for hits in 0..freq * secs {
                    assert_eq!(pacer.pace(elapsed, hits), Pace::NOW);
                }
            }
        }
    }

    #[test]
    fn test_constant_pacer_rate() {
        assert!(float_eq(ConstantPacer::new(60).rate(Duration::ZERO), 60.0));
        assert!(float_eq(ConstantPacer::new(500).rate(Duration::from_secs(5)), 500.0));
    }

    #[test]
    fn test_constant_pacer_display() {
        assert_eq!(ConstantPacer::new(5).to_string(), "Constant{5 hits / 1s}");
    }
}
