//! Paced run driver
//!
//! Drives a dry-run worker pool from a schedule profile: a worker ticker grows
//! and shrinks the pool, and every worker asks the shared pacer when to issue
//! its next (simulated) hit.
//!
//! ```text
//! cargo run -p volley-core --example paced_run -- profile.toml 10s
//! RUST_LOG=volley_core=debug cargo run -p volley-core --example paced_run
//! ```

use anyhow::Context;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volley_core::timing::{sleep_paced, RunClock};
use volley_core::{
    ConcurrencySchedule, LoadSchedule, Pace, Pacer, ScheduleProfile, TickValue, WorkerTicker,
};

const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(5);

/// One simulated worker: pace, then count a hit, until told to stop
struct Worker {
    retired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct Run {
    pacer: Arc<dyn Pacer>,
    clock: RunClock,
    hits: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
    deadline: Duration,
}

impl Run {
    fn spawn_worker(&self, id: usize) -> anyhow::Result<Worker> {
        let retired = Arc::new(AtomicBool::new(false));
        let pacer = self.pacer.clone();
        let hits = self.hits.clone();
        let stopped = self.stopped.clone();
        let clock = self.clock;
        let deadline = self.deadline;
        let flag = retired.clone();

        let handle = thread::Builder::new()
            .name(format!("volley-worker-{id}"))
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) && !stopped.load(Ordering::Relaxed) {
                    let elapsed = clock.elapsed();
                    if elapsed >= deadline {
                        break;
                    }

                    let Pace { wait, stop } = pacer.pace(elapsed, hits.load(Ordering::SeqCst));
                    if stop {
                        tracing::debug!("worker {} told to stop at {:?}", id, elapsed);
                        stopped.store(true, Ordering::Relaxed);
                        break;
                    }

                    sleep_paced(wait.min(deadline.saturating_sub(elapsed)));
                    if clock.elapsed() < deadline {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
            .context("Failed to spawn worker thread")?;

        Ok(Worker { retired, handle })
    }

    /// Grow or shrink `workers` by `delta`
    fn apply(&self, workers: &mut Vec<Worker>, delta: i64) -> anyhow::Result<()> {
        if delta >= 0 {
            for _ in 0..delta {
                let id = workers.len();
                workers.push(self.spawn_worker(id)?);
            }
        } else {
            let keep = workers.len().saturating_sub(delta.unsigned_abs() as usize);
            for worker in workers.drain(keep..) {
                worker.retired.store(true, Ordering::Relaxed);
                if worker.handle.join().is_err() {
                    tracing::warn!("worker thread panicked");
                }
            }
        }
        Ok(())
    }
}

fn load_profile() -> anyhow::Result<(ScheduleProfile, Duration)> {
    let mut args = std::env::args().skip(1);

    let profile = match args.next() {
        Some(path) => ScheduleProfile::from_file(&path)?,
        None => ScheduleProfile {
            load: LoadSchedule::Line { start: 20, slope: 20, end: 100, duration: None, max: 0 },
            concurrency: ConcurrencySchedule::Step {
                start: 2,
                step: 2,
                step_duration: Duration::from_secs(1),
                end: 8,
                duration: None,
            },
        },
    };

    let duration = match args.next() {
        Some(arg) => humantime::parse_duration(&arg)
            .with_context(|| format!("Invalid run duration: {arg}"))?,
        None => DEFAULT_RUN_DURATION,
    };

    Ok((profile, duration))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (profile, duration) = load_profile()?;
    let pacer: Arc<dyn Pacer> = Arc::from(profile.load.build()?);
    let ticker: Arc<dyn WorkerTicker> = Arc::from(profile.concurrency.build()?);

    tracing::info!("load: {}", pacer);
    tracing::info!("concurrency: {:?}", profile.concurrency);
    tracing::info!("duration: {}", humantime::format_duration(duration));

    let run = Run {
        pacer,
        clock: RunClock::start(),
        hits: Arc::new(AtomicU64::new(0)),
        stopped: Arc::new(AtomicBool::new(false)),
        deadline: duration,
    };

    let ticks = ticker.ticker();
    let runner = {
        let ticker = ticker.clone();
        thread::Builder::new()
            .name("volley-ticker-driver".to_string())
            .spawn(move || ticker.run())
            .context("Failed to spawn ticker thread")?
    };

    let mut workers = Vec::new();
    let mut ramp_done = false;
    loop {
        let remaining = run.deadline.saturating_sub(run.clock.elapsed());
        if remaining.is_zero() || run.stopped.load(Ordering::Relaxed) {
            break;
        }

        match ticks.recv_timeout(remaining) {
            Ok(TickValue { delta, done }) => {
                run.apply(&mut workers, delta)?;
                tracing::info!(
                    "{:.2?} workers={} hits={} rate={:.1}/s",
                    run.clock.elapsed(),
                    workers.len(),
                    run.hits.load(Ordering::SeqCst),
                    run.pacer.rate(run.clock.elapsed())
                );
                if done {
                    ramp_done = true;
                    break;
                }
            }
            Err(_) => break,
        }
    }

    for worker in workers {
        if worker.handle.join().is_err() {
            tracing::warn!("worker thread panicked");
        }
    }

    ticker.finish();
    if ramp_done {
        match runner.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("ticker failed: {}", e),
            Err(_) => tracing::warn!("ticker thread panicked"),
        }
    } else {
        // Still blocked on a handover nobody will take; exits with the process
        tracing::debug!("run ended before the concurrency ramp completed");
    }

    let elapsed = run.clock.elapsed();
    let hits = run.hits.load(Ordering::SeqCst);
    tracing::info!(
        "issued {} hits in {:.2?} ({:.1} hits/s)",
        hits,
        elapsed,
        hits as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
