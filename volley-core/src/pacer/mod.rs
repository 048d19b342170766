//! Hit pacing
//!
//! Pacers control WHEN the next hit should be issued. A worker asks its pacer
//! before every hit, sleeps for the returned wait and stops once the pacer says so.
//!
//! All pacers are pure functions of `(elapsed, hits)` once initialized, so a single
//! instance can be shared by every worker thread of a run.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod constant;
pub mod linear;
pub mod step;

pub use constant::ConstantPacer;
pub use linear::LinearPacer;
pub use step::{RampPlan, StepPacer};

/// Number of nanoseconds in one second
pub(crate) const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Largest next-hit timestamp (in nanoseconds) a pacer will schedule.
///
/// Schedules are kept within a signed 64-bit nanosecond range; a run that would
/// schedule past it is stopped instead.
pub(crate) const MAX_SCHEDULE_NS: u64 = i64::MAX as u64;

/// Pacer trait for hit-rate control
///
/// # Thread Safety
/// `pace` and `rate` may be called concurrently from any number of threads.
pub trait Pacer: Send + Sync + fmt::Display {
    /// Get how long to wait before the next hit
    ///
    /// # Parameters
    /// - `elapsed`: Time since the run started
    /// - `hits`: Hits issued so far
    fn pace(&self, elapsed: Duration, hits: u64) -> Pace;

    /// Get the instantaneous target rate (hits per second) at `elapsed`
    fn rate(&self, elapsed: Duration) -> f64;
}

/// Outcome of a single `Pacer::pace` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pace {
    /// Time to sleep before issuing the next hit (zero = send now)
    pub wait: Duration,
    /// The run is over, no further hits should be issued
    pub stop: bool,
}

impl Pace {
    /// Send the next hit immediately
    pub const NOW: Pace = Pace { wait: Duration::ZERO, stop: false };

    /// Stop issuing hits
    pub const STOP: Pace = Pace { wait: Duration::ZERO, stop: true };

    /// Send the next hit after `wait`
    pub const fn after(wait: Duration) -> Self {
        Self { wait, stop: false }
    }
}

impl<P: Pacer + ?Sized> Pacer for Box<P> {
    fn pace(&self, elapsed: Duration, hits: u64) -> Pace {
        (**self).pace(elapsed, hits)
    }

    fn rate(&self, elapsed: Duration) -> f64 {
        (**self).rate(elapsed)
    }
}

impl<P: Pacer + ?Sized> Pacer for Arc<P> {
    fn pace(&self, elapsed: Duration, hits: u64) -> Pace {
        (**self).pace(elapsed, hits)
    }

    fn rate(&self, elapsed: Duration) -> f64 {
        (**self).rate(elapsed)
    }
}

/// Number of whole `period`s contained in `elapsed`
#[inline]
pub(crate) fn whole_periods(elapsed: Duration, period: Duration) -> u64 {
    let periods = elapsed.as_nanos() / period.as_nanos();
    u64::try_from(periods).unwrap_or(u64::MAX)
}

/// Start of the `n`-th period, saturating at `u64::MAX` nanoseconds
#[inline]
pub(crate) fn nth_period(period: Duration, n: u64) -> Duration {
    let nanos = period.as_nanos().saturating_mul(u128::from(n));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
