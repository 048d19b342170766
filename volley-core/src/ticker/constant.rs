//! Constant worker count

use super::{emit, TickChannel, TickValue, WorkerTicker};
use crate::Result;
use crossbeam::channel::Receiver;

/// Constant worker ticker
///
/// Starts `workers` workers in a single terminal event and never adjusts them.
#[derive(Debug, Clone)]
pub struct ConstWorkerTicker {
    workers: u32,
    channel: TickChannel,
}

impl ConstWorkerTicker {
    /// Create a ticker on a new rendezvous stream
    pub fn new(workers: u32) -> Self {
        Self::with_channel(workers, TickChannel::rendezvous())
    }

    /// Create a ticker emitting on `channel`
    pub fn with_channel(workers: u32, channel: TickChannel) -> Self {
        Self { workers, channel }
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }
}

impl WorkerTicker for ConstWorkerTicker {
    fn ticker(&self) -> Receiver<TickValue> {
        self.channel.receiver()
    }

    fn run(&self) -> Result<()> {
        let tx = self.channel.sender()?;
        tracing::debug!("const worker ticker: starting {} workers", self.workers);
        emit(&tx, TickValue { delta: i64::from(self.workers), done: true })
    }

    fn finish(&self) {
        self.channel.close();
    }
}
