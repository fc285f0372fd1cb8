//! End-to-end behaviour of a single pipeline through the public API.

use std::collections::BTreeMap;
use std::time::Duration;

use weathercrab_core::config::AggregationConfig;
use weathercrab_core::finalizer::{FinalizedWindow, WindowPhase};
use weathercrab_core::pipeline::{MemorySink, RecordOutcome, ShutdownSignal, VecSource, WindowPipeline};
use weathercrab_core::reducer::{MeanReducer, Ohlc, OhlcReducer, ReducerKind, WindowResult};
use weathercrab_core::time::ManualClock;
use weathercrab_core::types::Record;
use weathercrab_core::window::WindowKey;

const SECOND: i64 = 1_000;

fn config(grace_secs: u64, fields: &[&str]) -> AggregationConfig {
    AggregationConfig {
        window_duration: Duration::from_secs(60),
        grace: Duration::from_secs(grace_secs),
        field_names: fields.iter().map(|f| f.to_string()).collect(),
        tick_interval: None,
        poll_timeout: Duration::from_millis(1),
        ..Default::default()
    }
}

fn temperatures() -> Vec<Record> {
    [(0, 10.0), (30, 20.0), (59, 30.0)]
        .into_iter()
        .map(|(secs, t)| Record::new(secs * SECOND).with_field("temperature", t))
        .collect()
}

fn run_to_completion<R>(config: &AggregationConfig, reducer: R, records: Vec<Record>) -> Vec<FinalizedWindow>
where
    R: weathercrab_core::reducer::Reducer + Clone,
{
    let sink = MemorySink::new();
    let mut pipeline = WindowPipeline::new(config, reducer, sink.clone()).unwrap();
    pipeline
        .run(&mut VecSource::new(records), &ShutdownSignal::new(), &ManualClock::new(0))
        .unwrap();
    sink.windows()
}

#[test]
fn mean_of_one_window() {
    let config = config(0, &["temperature"]);
    let windows = run_to_completion(&config, MeanReducer::new(config.field_names.clone()), temperatures());

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].window, WindowKey::new(0, 60 * SECOND));
    assert_eq!(
        windows[0].result,
        WindowResult::Mean(BTreeMap::from([("temperature".to_string(), 20.0)]))
    );
}

#[test]
fn ohlc_of_one_window() {
    let config = AggregationConfig {
        reducer_kind: ReducerKind::Ohlc,
        ..config(0, &["temperature"])
    };
    let windows = run_to_completion(&config, config.ohlc_reducer(), temperatures());

    let expected = Ohlc {
        open: 10.0,
        high: 30.0,
        low: 10.0,
        close: 30.0,
    };
    assert_eq!(
        windows[0].result,
        WindowResult::Ohlc(BTreeMap::from([("temperature".to_string(), expected)]))
    );
}

#[test]
fn grace_period_admits_then_rejects() {
    let config = config(5, &["temperature"]);
    let sink = MemorySink::new();
    let mut pipeline = WindowPipeline::new(&config, config.mean_reducer(), sink.clone()).unwrap();
    let window = WindowKey::new(0, 60 * SECOND);

    pipeline.process(Record::new(10 * SECOND).with_field("temperature", 10.0)).unwrap();
    pipeline.process(Record::new(64 * SECOND).with_field("temperature", 0.0)).unwrap();
    assert_eq!(pipeline.window_phase(None, &window), Some(WindowPhase::Open));

    // Clock at 64s, close boundary at 65s: still accepted.
    let outcome = pipeline.process(Record::new(58 * SECOND).with_field("temperature", 20.0)).unwrap();
    assert_eq!(outcome, RecordOutcome::Accepted { window, opened: false });

    pipeline.process(Record::new(66 * SECOND).with_field("temperature", 0.0)).unwrap();
    assert_eq!(pipeline.window_phase(None, &window), Some(WindowPhase::Evicted));

    let outcome = pipeline.process(Record::new(59 * SECOND).with_field("temperature", 99.0)).unwrap();
    assert_eq!(outcome, RecordOutcome::Late { window, close_at: 65 * SECOND });

    let windows = sink.windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(
        windows[0].result,
        WindowResult::Mean(BTreeMap::from([("temperature".to_string(), 15.0)]))
    );
    assert_eq!(pipeline.metrics().late_records, 1);
}

#[test]
fn missing_field_leaves_its_state_unset() {
    let fields = ["temperature", "humidity", "wind_speed"];
    let config = config(0, &fields);
    let records = vec![
        Record::new(0)
            .with_field("temperature", 12.0)
            .with_field("wind_speed", 4.0),
        Record::new(10 * SECOND)
            .with_field("temperature", 14.0)
            .with_field("wind_speed", 2.0),
    ];
    let windows = run_to_completion(&config, OhlcReducer::new(config.field_names.clone()), records);

    let WindowResult::Ohlc(result) = &windows[0].result else {
        panic!("expected an ohlc result");
    };
    assert!(!result.contains_key("humidity"));
    assert_eq!(result["temperature"].close, 14.0);
    assert_eq!(result["wind_speed"].high, 4.0);
}

#[test]
fn pending_window_is_emitted_when_source_closes() {
    let config = config(30, &["temperature"]);
    let records = vec![
        Record::new(0).with_field("temperature", 1.0),
        Record::new(61 * SECOND).with_field("temperature", 5.0),
    ];
    let windows = run_to_completion(&config, config.mean_reducer(), records);

    let starts: Vec<i64> = windows.iter().map(|w| w.window.start).collect();
    assert_eq!(starts, vec![0, 60 * SECOND]);
}

#[test]
fn ohlc_bounds_hold_over_a_noisy_series() {
    let config = config(0, &["temperature"]);
    let records: Vec<Record> = (0..500)
        .map(|i| {
            let value = ((i * 37) % 101) as f64 - 50.0;
            Record::new(i * 700).with_field("temperature", value)
        })
        .collect();
    let windows = run_to_completion(&config, config.ohlc_reducer(), records);

    assert!(!windows.is_empty());
    for window in &windows {
        let WindowResult::Ohlc(fields) = &window.result else {
            panic!("expected an ohlc result");
        };
        let ohlc = fields["temperature"];
        assert!(ohlc.low <= ohlc.open && ohlc.open <= ohlc.high);
        assert!(ohlc.low <= ohlc.close && ohlc.close <= ohlc.high);
    }
}

#[test]
fn mean_stays_within_observed_range() {
    let config = config(0, &["temperature"]);
    let records: Vec<Record> = (0..300)
        .map(|i| Record::new(i * 1_300).with_field("temperature", (i % 17) as f64 * 1.5))
        .collect();
    let windows = run_to_completion(&config, config.mean_reducer(), records);

    for window in &windows {
        let WindowResult::Mean(fields) = &window.result else {
            panic!("expected a mean result");
        };
        let mean = fields["temperature"];
        assert!((0.0..=24.0).contains(&mean), "mean {mean} out of range");
    }
}

#[test]
fn finalized_window_serializes_as_tagged_json() {
    let config = config(0, &["temperature"]);
    let windows = run_to_completion(&config, config.mean_reducer(), temperatures());

    let json = serde_json::to_value(&windows[0]).unwrap();
    assert_eq!(json["window"]["start"], 0);
    assert_eq!(json["result"]["reducer"], "mean");
    assert_eq!(json["result"]["fields"]["temperature"], 20.0);
}
