//! Step-ramp worker count

use super::{emit, panic_message, TickChannel, TickValue, WorkerTicker};
use crate::{Error, Result};
use crossbeam::channel::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Step worker ticker
///
/// Starts `start` workers, then adds `step` workers (negative = removes) every
/// `step_duration`. The ramp ends either when `max_duration` has elapsed, with a
/// final correction towards `stop`, or, without a max duration, once the worker
/// count reaches `stop`.
#[derive(Debug, Clone)]
pub struct StepWorkerTicker {
    start: u32,
    step: i64,
    step_duration: Duration,
    stop: u32,
    max_duration: Option<Duration>,
    channel: TickChannel,
}

/// Immutable ramp parameters moved into the ticker thread
#[derive(Debug, Clone, Copy)]
struct Ramp {
    step: i64,
    stop: i64,
    max_duration: Option<Duration>,
}

impl StepWorkerTicker {
    /// Create a ticker on a new rendezvous stream
    ///
    /// # Parameters
    /// - `start`: Initial worker count
    /// - `step`: Workers added every `step_duration` (must be non-zero)
    /// - `step_duration`: Time between adjustments (must be non-zero)
    pub fn new(start: u32, step: i64, step_duration: Duration) -> Result<Self> {
        if step == 0 {
            return Err(Error::Config("StepWorkerTicker step cannot be 0".to_string()));
        }
        if step_duration.is_zero() {
            return Err(Error::Config("StepWorkerTicker step duration cannot be 0".to_string()));
        }

        Ok(Self {
            start,
            step,
            step_duration,
            stop: 0,
            max_duration: None,
            channel: TickChannel::rendezvous(),
        })
    }

    /// Emit on `channel` instead of a private stream
    pub fn with_channel(mut self, channel: TickChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Target worker count (0 = none)
    pub fn with_stop(mut self, stop: u32) -> Self {
        self.stop = stop;
        self
    }

    /// Ramp-time budget (zero = none)
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration).filter(|d| !d.is_zero());
        self
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    fn ramp(&self) -> Ramp {
        Ramp { step: self.step, stop: i64::from(self.stop), max_duration: self.max_duration }
    }
}

impl Ramp {
    /// Emit one adjustment per timer tick until a terminal condition holds
    ///
    /// `workers` is owned by this loop; nothing else writes the worker count.
    fn run(
        self,
        tx: &Sender<TickValue>,
        steps: &Receiver<Instant>,
        begin: Instant,
        mut workers: i64,
    ) -> Result<()> {
        let step_up = self.step > 0;

        for _ in steps.iter() {
            let elapsed = begin.elapsed();

            match self.max_duration {
                Some(max_duration) if elapsed >= max_duration => {
                    let short_of_stop =
                        if step_up { self.stop >= workers } else { self.stop <= workers };
                    let delta = if self.stop > 0 && short_of_stop { self.stop - workers } else { 0 };
                    tracing::debug!(
                        "worker ticker: max duration reached at {} workers after {:?}, final delta {}",
                        workers,
                        elapsed,
                        delta
                    );
                    return emit(tx, TickValue { delta, done: true });
                }
                None if self.stop > 0
                    && (if step_up { workers >= self.stop } else { workers <= self.stop }) =>
                {
                    tracing::debug!(
                        "worker ticker: stop reached at {} workers after {:?}",
                        workers,
                        elapsed
                    );
                    return emit(tx, TickValue { delta: 0, done: true });
                }
                _ => {}
            }

            // Ends a ramp-down at zero workers even before max_duration elapses
            if !step_up && workers <= 0 {
                tracing::debug!("worker ticker: no workers left after {:?}", elapsed);
                return emit(tx, TickValue { delta: 0, done: true });
            }

            // Unlike a plain `step` delta, a ramp-down step is cut short at zero
            // workers, so the running sum of deltas never goes negative
            let delta = self.step.max(-workers);
            tracing::trace!("worker ticker: {:+} workers at {:?}", delta, elapsed);
            emit(tx, TickValue { delta, done: false })?;
            workers += delta;
        }

        Err(Error::Ticker("step timer stopped unexpectedly".to_string()))
    }
}

impl WorkerTicker for StepWorkerTicker {
    fn ticker(&self) -> Receiver<TickValue> {
        self.channel.receiver()
    }

    fn run(&self) -> Result<()> {
        let tx = self.channel.sender()?;
        let ramp = self.ramp();
        let steps = channel::tick(self.step_duration);
        let begin = Instant::now();
        let start = i64::from(self.start);

        tracing::debug!(
            "step worker ticker: start={} step={} every {:?}",
            self.start,
            self.step,
            self.step_duration
        );
        emit(&tx, TickValue { delta: start, done: false })?;

        let (done_tx, done_rx) = channel::bounded(1);
        let handle = thread::Builder::new().name("volley-worker-ticker".to_string()).spawn(
            move || {
                let outcome = ramp.run(&tx, &steps, begin, start);
                // Run is only waiting on this channel; it cannot be gone yet
                let _ = done_tx.send(outcome);
            },
        )?;

        let outcome = done_rx.recv();
        handle
            .join()
            .map_err(|e| {
                let msg = panic_message(e.as_ref());
                Error::Ticker(format!("worker ticker thread panicked: {msg}"))
            })?;
        outcome.map_err(|_| Error::Ticker("worker ticker thread exited early".to_string()))?
    }

    fn finish(&self) {
        self.channel.close();
    }
}
