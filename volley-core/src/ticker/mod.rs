//! Worker-count schedules
//!
//! Worker tickers control HOW MANY workers a driver should keep active. A ticker
//! emits [`TickValue`] deltas over a bounded channel; the driver adds each delta
//! to its worker pool and stops listening after the `done` event.
//!
//! Each ticker has exactly one producer (its `run` call and the background thread
//! it owns) and is meant to be drained by one consumer. Sends block until the
//! consumer receives, so a slow consumer delays the ticker's own schedule.

use crate::{Error, Result};
use crossbeam::channel::{self, Receiver, Sender};
use std::any::Any;
use std::sync::{Arc, Mutex};

pub mod constant;
pub mod line;
pub mod step;

pub use constant::ConstWorkerTicker;
pub use line::LineWorkerTicker;
pub use step::StepWorkerTicker;

/// One worker-count adjustment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickValue {
    /// Change to apply to the active worker count
    pub delta: i64,
    /// Terminal event: no further values follow
    pub done: bool,
}

/// WorkerTicker trait for concurrency schedules
pub trait WorkerTicker: Send + Sync {
    /// Get the read side of the tick stream (valid in any state)
    fn ticker(&self) -> Receiver<TickValue>;

    /// Emit the whole schedule, returning once the terminal event was received
    fn run(&self) -> Result<()>;

    /// Close the tick stream
    ///
    /// Call only after `run` has returned; a later `run` fails.
    fn finish(&self);
}

impl<T: WorkerTicker + ?Sized> WorkerTicker for Box<T> {
    fn ticker(&self) -> Receiver<TickValue> {
        (**self).ticker()
    }

    fn run(&self) -> Result<()> {
        (**self).run()
    }

    fn finish(&self) {
        (**self).finish()
    }
}

impl<T: WorkerTicker + ?Sized> WorkerTicker for Arc<T> {
    fn ticker(&self) -> Receiver<TickValue> {
        (**self).ticker()
    }

    fn run(&self) -> Result<()> {
        (**self).run()
    }

    fn finish(&self) {
        (**self).finish()
    }
}

/// Shared tick stream between one ticker and its consumer
///
/// Cloning shares the same stream; closing any clone closes it for all.
#[derive(Debug, Clone)]
pub struct TickChannel {
    tx: Arc<Mutex<Option<Sender<TickValue>>>>,
    rx: Receiver<TickValue>,
}

impl TickChannel {
    /// Create a rendezvous stream (every send waits for its receive)
    pub fn rendezvous() -> Self {
        Self::with_capacity(0)
    }

    /// Create a stream buffering up to `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        Self { tx: Arc::new(Mutex::new(Some(tx))), rx }
    }

    /// Get a receiver for the stream
    pub fn receiver(&self) -> Receiver<TickValue> {
        self.rx.clone()
    }

    /// Get a producer handle, failing once the stream was closed
    pub(crate) fn sender(&self) -> Result<Sender<TickValue>> {
        let guard = self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| Error::Ticker("tick stream already finished".to_string()))
    }

    /// Drop the stored producer handle
    ///
    /// Receivers see the stream disconnect after draining buffered values, once
    /// no producer handle from `sender` is alive.
    pub fn close(&self) {
        let mut guard = self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.take();
    }

    /// Check whether the stream was closed
    pub fn is_closed(&self) -> bool {
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).is_none()
    }
}

impl Default for TickChannel {
    fn default() -> Self {
        Self::rendezvous()
    }
}

/// Send one tick, mapping a disconnected stream to a ticker error
pub(crate) fn emit(tx: &Sender<TickValue>, value: TickValue) -> Result<()> {
    tx.send(value).map_err(|_| Error::Ticker("tick stream disconnected".to_string()))
}

/// Message carried by a thread panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}
