//! Run timing utilities
//!
//! Pacers reason in elapsed time since the start of a run. `RunClock` provides
//! that monotonic timeline and `sleep_paced` honours a pacer's wait with
//! microsecond-level precision.

use std::time::{Duration, Instant};

/// Below this, `sleep_paced` spins instead of asking the OS scheduler
const SPIN_THRESHOLD: Duration = Duration::from_micros(200);

/// Monotonic clock anchored at the start of a run
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    started: Instant,
}

impl RunClock {
    /// Start a new run clock now
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    /// Time elapsed since the run started
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Instant at which the run started
    pub fn started(&self) -> Instant {
        self.started
    }
}

impl Default for RunClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Wait for `wait`, sleeping through most of it and spinning the last stretch
///
/// Thread sleeps overshoot by tens of microseconds; spinning the final
/// `SPIN_THRESHOLD` keeps paced hits on schedule at the cost of some CPU.
///
/// # Example
/// ```
/// use std::time::{Duration, Instant};
/// use volley_core::timing::sleep_paced;
///
/// let start = Instant::now();
/// sleep_paced(Duration::from_micros(500));
/// assert!(start.elapsed() >= Duration::from_micros(500));
/// ```
pub fn sleep_paced(wait: Duration) {
    if wait.is_zero() {
        return;
    }

    let deadline = Instant::now() + wait;
    if wait > SPIN_THRESHOLD {
        std::thread::sleep(wait - SPIN_THRESHOLD);
    }

    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}
