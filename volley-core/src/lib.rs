//! Volley Core Library
//!
//! This crate provides the traffic-shaping core of the Volley load generator:
//! pacers that decide *when* the next hit should be issued, and worker tickers
//! that decide *how many* concurrent workers should be active over time.
//!
//! Pacers are pure functions of elapsed time and hits issued so far and may be
//! shared by any number of worker threads. Worker tickers run a background
//! thread that emits worker-count deltas on a rendezvous channel.

pub mod config;
pub mod error;
pub mod pacer;
pub mod ticker;
pub mod timing;

pub use config::{ConcurrencySchedule, LoadSchedule, ScheduleProfile};
pub use error::{Error, Result};
pub use pacer::{ConstantPacer, LinearPacer, Pace, Pacer, RampPlan, StepPacer};
pub use ticker::{
    ConstWorkerTicker, LineWorkerTicker, StepWorkerTicker, TickChannel, TickValue, WorkerTicker,
};
