//! Worker ticker schedules driving a worker pool

use std::thread;
use std::time::{Duration, Instant};
use volley_core::ticker::{
    ConstWorkerTicker, LineWorkerTicker, StepWorkerTicker, TickChannel, TickValue, WorkerTicker,
};

/// Consume a ticker like a driver does: apply every delta until `done`
fn drive<T: WorkerTicker + Clone + 'static>(wt: T) -> (Vec<(TickValue, Duration)>, i64) {
    let rx = wt.ticker();
    let runner = {
        let wt = wt.clone();
        thread::spawn(move || wt.run())
    };

    let begin = Instant::now();
    let mut workers = 0;
    let mut events = Vec::new();
    for tick in rx.iter() {
        workers += tick.delta;
        events.push((tick, begin.elapsed()));
        if tick.done {
            break;
        }
    }

    runner.join().expect("ticker thread panicked").expect("ticker run failed");
    wt.finish();
    (events, workers)
}

#[test]
fn test_const_ticker_single_terminal_event() {
    let (events, workers) = drive(ConstWorkerTicker::new(8));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, TickValue { delta: 8, done: true });
    assert_eq!(workers, 8);
}

#[test]
fn test_step_ticker_corrects_to_stop_at_max_duration() {
    // Scaled-down version of start 5, +2 every 2s, 5s budget, stop 15
    let wt = StepWorkerTicker::new(5, 2, Duration::from_millis(200))
        .unwrap()
        .with_stop(15)
        .with_max_duration(Duration::from_millis(500));

    let (events, workers) = drive(wt);
    let values: Vec<_> = events.iter().map(|(v, _)| (v.delta, v.done)).collect();
    assert_eq!(values, vec![(5, false), (2, false), (2, false), (6, true)]);
    assert_eq!(workers, 15);

    let expected = [0, 200, 400, 600];
    for ((_, at), expected_ms) in events.iter().zip(expected) {
        let expected = Duration::from_millis(expected_ms);
        let diff = if *at > expected { *at - expected } else { expected - *at };
        assert!(diff < Duration::from_millis(100), "event at {at:?}, expected ~{expected:?}");
    }
}

#[test]
fn test_done_is_last_value_on_stream() {
    let channel = TickChannel::rendezvous();
    let wt = StepWorkerTicker::new(2, 1, Duration::from_millis(10))
        .unwrap()
        .with_channel(channel.clone())
        .with_stop(4);

    let (events, workers) = drive(wt);
    assert!(events.last().unwrap().0.done);
    assert_eq!(events.iter().filter(|(v, _)| v.done).count(), 1);
    assert_eq!(workers, 4);

    // Finished after run: no more values, stream disconnected
    assert!(channel.is_closed());
    assert!(channel.receiver().recv().is_err());
}

#[test]
fn test_slow_consumer_delays_schedule() {
    let wt = StepWorkerTicker::new(1, 1, Duration::from_millis(10)).unwrap().with_stop(3);
    let rx = wt.ticker();
    let runner = {
        let wt = wt.clone();
        thread::spawn(move || wt.run())
    };

    let mut values = Vec::new();
    for tick in rx.iter() {
        thread::sleep(Duration::from_millis(50));
        values.push(tick);
        if tick.done {
            break;
        }
    }
    runner.join().unwrap().unwrap();
    wt.finish();

    // Nothing is dropped or buffered ahead while the consumer lags
    let deltas: Vec<_> = values.iter().map(|v| v.delta).collect();
    assert_eq!(deltas, vec![1, 1, 1, 0]);
}

#[test]
fn test_line_ticker_through_trait_object() {
    let wt: Box<dyn WorkerTicker> = Box::new(LineWorkerTicker::new(3, -3).unwrap());
    let rx = wt.ticker();

    thread::scope(|s| {
        let runner = s.spawn(|| wt.run());
        assert_eq!(rx.recv().unwrap(), TickValue { delta: 3, done: false });
        assert_eq!(rx.recv().unwrap(), TickValue { delta: -3, done: false });
        assert_eq!(rx.recv().unwrap(), TickValue { delta: 0, done: true });
        runner.join().unwrap().unwrap();
    });

    wt.finish();
}
