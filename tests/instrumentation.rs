//! End-to-end properties of the operation envelope against a shared sink.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use opwrap::{InstrumentConfig, Instrumenter, MetricsSink, Outcome};

fn instrumenter(sink: &MetricsSink) -> Instrumenter {
    Instrumenter::new(&InstrumentConfig::default(), Some(sink)).unwrap()
}

#[test]
fn one_finish_records_exactly_one_of_each() {
    let sink = MetricsSink::new();
    let inst = instrumenter(&sink);

    inst.begin("get").finish(Outcome::Success);

    let total = sink
        .counter("operations_total", "", &["operation", "status", "service"])
        .unwrap();
    let duration = sink
        .histogram("operation_duration_seconds", "", &["operation", "service"], &[])
        .unwrap();

    assert_eq!(total.value(&["get", "success", "default"]), 1.0);
    assert_eq!(duration.sample_count(&["get", "default"]), 1);
}

#[test]
fn concurrent_callers_lose_no_updates() {
    const CALLERS: usize = 128;

    let sink = Arc::new(MetricsSink::new());
    let inst = Arc::new(instrumenter(&sink));

    thread::scope(|scope| {
        for i in 0..CALLERS {
            let inst = Arc::clone(&inst);
            scope.spawn(move || {
                let ctx = inst.begin("get");
                // delegated call: alternate outcomes to exercise both series
                let outcome = if i % 2 == 0 {
                    Outcome::Success
                } else {
                    Outcome::Error
                };
                ctx.finish(outcome);
            });
        }
    });

    let total = sink
        .counter("operations_total", "", &["operation", "status", "service"])
        .unwrap();
    let duration = sink
        .histogram("operation_duration_seconds", "", &["operation", "service"], &[])
        .unwrap();

    let successes = total.value(&["get", "success", "default"]);
    let errors = total.value(&["get", "error", "default"]);
    assert_eq!(successes + errors, CALLERS as f64);
    assert_eq!(successes, (CALLERS / 2) as f64);
    assert_eq!(duration.sample_count(&["get", "default"]), CALLERS as u64);
}

#[test]
fn observed_duration_tracks_the_delegated_call() {
    let sink = MetricsSink::new();
    let inst = instrumenter(&sink);

    let ctx = inst.begin("get");
    thread::sleep(Duration::from_millis(5));
    let result: Result<&str, String> = Ok("v");
    ctx.finish_result(&result);

    let duration = sink
        .histogram("operation_duration_seconds", "", &["operation", "service"], &[])
        .unwrap();
    let sum = duration.sample_sum(&["get", "default"]);

    // lower bound is exact; upper bound leaves generous room for scheduling jitter
    assert!(sum >= 0.005, "observed {sum}, expected at least 5ms");
    assert!(sum < 0.5, "observed {sum}, scheduling jitter beyond reason");

    let total = sink
        .counter("operations_total", "", &["operation", "status", "service"])
        .unwrap();
    assert_eq!(total.value(&["get", "success", "default"]), 1.0);
}

#[test]
fn disabled_instrumentation_never_touches_the_sink() {
    let sink = MetricsSink::new();
    let config = InstrumentConfig {
        enabled: false,
        ..InstrumentConfig::default()
    };
    let inst = Instrumenter::new(&config, Some(&sink)).unwrap();

    inst.begin("get").finish(Outcome::Success);
    inst.begin("set").finish(Outcome::Error);

    assert_eq!(sink.render(), "");
}

#[test]
fn separately_obtained_handles_share_the_series() {
    let sink = MetricsSink::new();

    let a = sink
        .counter("shared_total", "Shared counter", &["operation"])
        .unwrap();
    let b = sink
        .counter("shared_total", "Shared counter", &["operation"])
        .unwrap();

    a.increment(&["get"]);
    b.increment(&["get"]);

    assert_eq!(a.value(&["get"]), 2.0);
    assert_eq!(b.value(&["get"]), 2.0);
}
