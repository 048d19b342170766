//! Linear worker count

use super::{StepWorkerTicker, TickChannel, TickValue, WorkerTicker};
use crate::{Error, Result};
use crossbeam::channel::Receiver;
use std::time::Duration;

/// Line worker ticker
///
/// Adds `slope` workers every second, starting from `start`. Runs a
/// [`StepWorkerTicker`] with one-second steps on the same stream.
#[derive(Debug, Clone)]
pub struct LineWorkerTicker {
    slope: i64,
    steps: StepWorkerTicker,
}

impl LineWorkerTicker {
    /// Create a ticker on a new rendezvous stream
    ///
    /// # Parameters
    /// - `start`: Initial worker count
    /// - `slope`: Workers added per second (must be non-zero)
    pub fn new(start: u32, slope: i64) -> Result<Self> {
        if slope == 0 {
            return Err(Error::Config("LineWorkerTicker slope cannot be 0".to_string()));
        }

        let steps = StepWorkerTicker::new(start, slope, Duration::from_secs(1))?;
        Ok(Self { slope, steps })
    }

    /// Emit on `channel` instead of a private stream
    pub fn with_channel(mut self, channel: TickChannel) -> Self {
        self.steps = self.steps.with_channel(channel);
        self
    }

    /// Target worker count (0 = none)
    pub fn with_stop(mut self, stop: u32) -> Self {
        self.steps = self.steps.with_stop(stop);
        self
    }

    /// Ramp-time budget (zero = none)
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.steps = self.steps.with_max_duration(max_duration);
        self
    }

    pub fn slope(&self) -> i64 {
        self.slope
    }
}

impl WorkerTicker for LineWorkerTicker {
    fn ticker(&self) -> Receiver<TickValue> {
        self.steps.ticker()
    }

    fn run(&self) -> Result<()> {
        self.steps.run()
    }

    fn finish(&self) {
        self.steps.finish()
    }
}
