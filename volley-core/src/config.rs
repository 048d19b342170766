//! Schedule configuration
//!
//! TOML-friendly descriptions of the load (hit rate) and concurrency (worker
//! count) schedules of a run. Each schedule validates itself and builds the
//! matching pacer or worker ticker.
//!
//! ```toml
//! [load]
//! schedule = "step"
//! start = 5
//! step = 5
//! step_duration = "5s"
//! end = 25
//!
//! [concurrency]
//! schedule = "line"
//! start = 1
//! slope = 2
//! duration = "30s"
//! ```

use crate::pacer::{ConstantPacer, LinearPacer, Pacer, StepPacer};
use crate::ticker::{ConstWorkerTicker, LineWorkerTicker, StepWorkerTicker, WorkerTicker};
use crate::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Load schedule (hit rate over time)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "schedule", rename_all = "lowercase")]
pub enum LoadSchedule {
    Const {
        /// Hits per second (0 = unlimited)
        #[serde(default)]
        rate: u64,
        /// Total hit cap (0 = unlimited)
        #[serde(default)]
        max: u64,
    },
    Step {
        start: u64,
        step: i64,
        #[serde(with = "humantime_serde")]
        step_duration: Duration,
        /// Rate to hold once crossed (0 = none)
        #[serde(default)]
        end: u64,
        /// Ramp duration before holding the rate
        #[serde(with = "humantime_serde", default)]
        duration: Option<Duration>,
        #[serde(default)]
        max: u64,
    },
    Line {
        start: u64,
        slope: i64,
        #[serde(default)]
        end: u64,
        #[serde(with = "humantime_serde", default)]
        duration: Option<Duration>,
        #[serde(default)]
        max: u64,
    },
}

impl Default for LoadSchedule {
    fn default() -> Self {
        LoadSchedule::Const { rate: 0, max: 0 }
    }
}

impl LoadSchedule {
    /// Validate schedule parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            LoadSchedule::Const { .. } => {}
            LoadSchedule::Step { start, step, step_duration, end, .. } => {
                check_ramp("load", *start, *step, *end)?;
                if step_duration.is_zero() {
                    return Err(Error::Config("invalid load step duration".to_string()));
                }
            }
            LoadSchedule::Line { start, slope, end, .. } => {
                check_ramp("load", *start, *slope, *end)?;
            }
        }
        Ok(())
    }

    /// Build the pacer described by this schedule
    pub fn build(&self) -> Result<Box<dyn Pacer>> {
        self.validate()?;

        let pacer: Box<dyn Pacer> = match *self {
            LoadSchedule::Const { rate, max } => Box::new(ConstantPacer::new(rate).with_max(max)),
            LoadSchedule::Step { start, step, step_duration, end, duration, max } => Box::new(
                StepPacer::new(ConstantPacer::new(start), step, step_duration)?
                    .with_stop(ConstantPacer::new(end))
                    .with_load_duration(duration.unwrap_or_default())
                    .with_max(max),
            ),
            LoadSchedule::Line { start, slope, end, duration, max } => Box::new(
                LinearPacer::new(ConstantPacer::new(start), slope)?
                    .with_stop(ConstantPacer::new(end))
                    .with_load_duration(duration.unwrap_or_default())
                    .with_max(max),
            ),
        };

        tracing::debug!("load schedule: {}", pacer);
        Ok(pacer)
    }
}

/// Concurrency schedule (worker count over time)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "schedule", rename_all = "lowercase")]
pub enum ConcurrencySchedule {
    Const {
        #[serde(default = "default_workers")]
        workers: u32,
    },
    Step {
        start: u32,
        step: i64,
        #[serde(with = "humantime_serde")]
        step_duration: Duration,
        /// Target worker count (0 = none)
        #[serde(default)]
        end: u32,
        /// Ramp-time budget
        #[serde(with = "humantime_serde", default)]
        duration: Option<Duration>,
    },
    Line {
        start: u32,
        slope: i64,
        #[serde(default)]
        end: u32,
        #[serde(with = "humantime_serde", default)]
        duration: Option<Duration>,
    },
}

fn default_workers() -> u32 {
    50
}

impl Default for ConcurrencySchedule {
    fn default() -> Self {
        ConcurrencySchedule::Const { workers: default_workers() }
    }
}

impl ConcurrencySchedule {
    /// Validate schedule parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            ConcurrencySchedule::Const { workers } => {
                if *workers == 0 {
                    return Err(Error::Config("concurrency workers must be > 0".to_string()));
                }
            }
            ConcurrencySchedule::Step { start, step, step_duration, end, .. } => {
                check_ramp("concurrency", u64::from(*start), *step, u64::from(*end))?;
                if step_duration.is_zero() {
                    return Err(Error::Config("invalid concurrency step duration".to_string()));
                }
            }
            ConcurrencySchedule::Line { start, slope, end, .. } => {
                check_ramp("concurrency", u64::from(*start), *slope, u64::from(*end))?;
            }
        }
        Ok(())
    }

    /// Build the worker ticker described by this schedule
    pub fn build(&self) -> Result<Box<dyn WorkerTicker>> {
        self.validate()?;

        let ticker: Box<dyn WorkerTicker> = match *self {
            ConcurrencySchedule::Const { workers } => Box::new(ConstWorkerTicker::new(workers)),
            ConcurrencySchedule::Step { start, step, step_duration, end, duration } => Box::new(
                StepWorkerTicker::new(start, step, step_duration)?
                    .with_stop(end)
                    .with_max_duration(duration.unwrap_or_default()),
            ),
            ConcurrencySchedule::Line { start, slope, end, duration } => Box::new(
                LineWorkerTicker::new(start, slope)?
                    .with_stop(end)
                    .with_max_duration(duration.unwrap_or_default()),
            ),
        };

        tracing::debug!("concurrency schedule: {:?}", self);
        Ok(ticker)
    }
}

fn check_ramp(kind: &str, start: u64, step: i64, end: u64) -> Result<()> {
    if start == end {
        return Err(Error::Config(format!("{kind} start cannot equal {kind} end")));
    }
    if step == 0 {
        return Err(Error::Config(format!("invalid {kind} step")));
    }
    Ok(())
}

/// Load and concurrency schedules of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleProfile {
    #[serde(default)]
    pub load: LoadSchedule,
    #[serde(default)]
    pub concurrency: ConcurrencySchedule,
}

impl ScheduleProfile {
    /// Parse a profile from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let profile: ScheduleProfile =
            toml::from_str(content).context("Failed to parse schedule profile")?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schedule profile: {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Validate both schedules
    pub fn validate(&self) -> Result<()> {
        self.load.validate()?;
        self.concurrency.validate()
    }
}
