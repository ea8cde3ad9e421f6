//! Instrumented operation envelope
//!
//! Every delegated call a wrapper makes runs inside an envelope: `begin`
//! captures the operation name and a start instant, `finish` classifies the
//! outcome and records one duration observation plus one counter increment.
//! Both ends are synchronous and non-blocking; the delegated call in between
//! is free to block or suspend.
//!
//! The envelope never fails and never touches the delegated call's return
//! value. When instrumentation is disabled, or no sink is attached, `finish`
//! is a no-op.

use std::time::{Duration, Instant};

use crate::config::InstrumentConfig;
use crate::error::Result;
use crate::sink::{CounterHandle, HistogramHandle, MetricsSink};

/// Binary outcome of a delegated call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    /// The status label value recorded for this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }

    /// Derive the outcome from a delegated call's result. Any error, of any
    /// kind, counts as [`Outcome::Error`]; there is no finer classification
    /// at the metrics level.
    pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Error,
        }
    }
}

/// Per-client instrumentation state shared by all of that client's envelopes
#[derive(Debug)]
pub struct Instrumenter {
    service: String,
    extra_labels: Vec<String>,
    series: Option<Series>,
}

#[derive(Debug)]
struct Series {
    duration: HistogramHandle,
    total: CounterHandle,
}

impl Instrumenter {
    /// Build an instrumenter from configuration and an optional sink.
    ///
    /// When the configuration disables metrics, or no sink is supplied,
    /// the instrumenter is inert and every envelope it opens finishes as a
    /// no-op. Series are registered here, once, so label names are validated
    /// before the first operation runs.
    pub fn new(config: &InstrumentConfig, sink: Option<&MetricsSink>) -> Result<Self> {
        let series = match sink {
            Some(sink) if config.enabled => {
                let extra: Vec<&str> = config.extra_labels.iter().map(String::as_str).collect();

                let mut duration_labels = vec!["operation", "service"];
                duration_labels.extend_from_slice(&extra);
                let duration = sink.histogram(
                    &config.duration_metric,
                    "Operation duration in seconds",
                    &duration_labels,
                    &config.buckets,
                )?;

                let mut counter_labels = vec!["operation", "status", "service"];
                counter_labels.extend_from_slice(&extra);
                let total = sink.counter(
                    &config.counter_metric,
                    "Total number of operations",
                    &counter_labels,
                )?;

                Some(Series { duration, total })
            }
            _ => None,
        };

        Ok(Self {
            service: config.service.clone(),
            extra_labels: config.extra_labels.clone(),
            series,
        })
    }

    /// Whether this instrumenter records anything at all.
    pub fn enabled(&self) -> bool {
        self.series.is_some()
    }

    /// Open an envelope for one delegated call.
    ///
    /// Captures the current instant and nothing else. Never fails.
    pub fn begin(&self, op: &str) -> OperationContext<'_> {
        OperationContext {
            owner: self,
            op: op.to_string(),
            start: Instant::now(),
            extra_values: vec![None; self.extra_labels.len()],
        }
    }
}

/// One open envelope around a delegated call.
///
/// Created by [`Instrumenter::begin`] and consumed by
/// [`OperationContext::finish`]; the move enforces the open-then-closed
/// lifecycle, a context cannot be finished twice. Callers are responsible for
/// reaching `finish` on every exit path; the envelope does not run on panic.
pub struct OperationContext<'a> {
    owner: &'a Instrumenter,
    op: String,
    start: Instant,
    extra_values: Vec<Option<String>>,
}

impl OperationContext<'_> {
    /// Attach a value for an extra label declared on the instrumenter.
    ///
    /// Unknown label names are ignored with a warning; undeclared labels must
    /// not invent new series.
    #[must_use]
    pub fn label(mut self, name: &str, value: &str) -> Self {
        match self.owner.extra_labels.iter().position(|l| l == name) {
            Some(i) => self.extra_values[i] = Some(value.to_string()),
            None => tracing::warn!(
                op = %self.op,
                label = name,
                "ignoring value for undeclared label"
            ),
        }
        self
    }

    /// Time elapsed since `begin`.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Close the envelope, recording the duration and outcome.
    ///
    /// No-op when the owning instrumenter is inert. Extra labels left unset
    /// record as the empty string so the series key stays stable.
    pub fn finish(self, outcome: Outcome) {
        let Some(series) = &self.owner.series else {
            return;
        };

        let elapsed = self.start.elapsed().as_secs_f64();
        let extra: Vec<&str> = self
            .extra_values
            .iter()
            .map(|v| v.as_deref().unwrap_or(""))
            .collect();

        let mut duration_values = Vec::with_capacity(2 + extra.len());
        duration_values.push(self.op.as_str());
        duration_values.push(self.owner.service.as_str());
        duration_values.extend_from_slice(&extra);
        series.duration.observe(&duration_values, elapsed);

        let mut counter_values = Vec::with_capacity(3 + extra.len());
        counter_values.push(self.op.as_str());
        counter_values.push(outcome.as_str());
        counter_values.push(self.owner.service.as_str());
        counter_values.extend_from_slice(&extra);
        series.total.increment(&counter_values);
    }

    /// Close the envelope, deriving the outcome from a delegated call's
    /// result. The result itself is left untouched for the caller.
    pub fn finish_result<T, E>(self, result: &std::result::Result<T, E>) {
        self.finish(Outcome::of(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstrumentConfig;
    use crate::sink::MetricsSink;

    fn config(service: &str) -> InstrumentConfig {
        InstrumentConfig {
            service: service.to_string(),
            ..InstrumentConfig::default()
        }
    }

    #[test]
    fn records_one_observation_and_one_increment() {
        let sink = MetricsSink::new();
        let instrumenter = Instrumenter::new(&config("cache"), Some(&sink)).unwrap();

        let ctx = instrumenter.begin("get");
        ctx.finish(Outcome::Success);

        let total = sink
            .counter("operations_total", "", &["operation", "status", "service"])
            .unwrap();
        assert_eq!(total.value(&["get", "success", "cache"]), 1.0);

        let duration = sink
            .histogram("operation_duration_seconds", "", &["operation", "service"], &[])
            .unwrap();
        assert_eq!(duration.sample_count(&["get", "cache"]), 1);
    }

    #[test]
    fn outcome_classification_is_binary() {
        let ok: std::result::Result<&str, String> = Ok("v");
        let not_found: std::result::Result<&str, String> = Err("key not found".to_string());
        let server: std::result::Result<&str, String> = Err("boom".to_string());

        assert_eq!(Outcome::of(&ok), Outcome::Success);
        assert_eq!(Outcome::of(&not_found), Outcome::Error);
        assert_eq!(Outcome::of(&server), Outcome::Error);
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::Error.as_str(), "error");
    }

    #[test]
    fn error_outcome_recorded_under_error_label() {
        let sink = MetricsSink::new();
        let instrumenter = Instrumenter::new(&config("cache"), Some(&sink)).unwrap();

        let result: std::result::Result<(), String> = Err("boom".to_string());
        let ctx = instrumenter.begin("set");
        ctx.finish_result(&result);

        let total = sink
            .counter("operations_total", "", &["operation", "status", "service"])
            .unwrap();
        assert_eq!(total.value(&["set", "error", "cache"]), 1.0);
        assert_eq!(total.value(&["set", "success", "cache"]), 0.0);
    }

    #[test]
    fn disabled_records_nothing() {
        let sink = MetricsSink::new();
        let mut cfg = config("cache");
        cfg.enabled = false;
        let instrumenter = Instrumenter::new(&cfg, Some(&sink)).unwrap();
        assert!(!instrumenter.enabled());

        instrumenter.begin("get").finish(Outcome::Success);
        assert!(!sink.render().contains("operations_total"));
    }

    #[test]
    fn missing_sink_records_nothing() {
        let instrumenter = Instrumenter::new(&config("cache"), None).unwrap();
        assert!(!instrumenter.enabled());
        // must not panic with no series attached
        instrumenter.begin("get").finish(Outcome::Error);
    }

    #[test]
    fn extra_labels_recorded_in_declared_order() {
        let sink = MetricsSink::new();
        let cfg = InstrumentConfig {
            service: "docs".to_string(),
            extra_labels: vec!["collection".to_string()],
            ..InstrumentConfig::default()
        };
        let instrumenter = Instrumenter::new(&cfg, Some(&sink)).unwrap();

        instrumenter
            .begin("find")
            .label("collection", "users")
            .finish(Outcome::Success);

        let total = sink
            .counter(
                "operations_total",
                "",
                &["operation", "status", "service", "collection"],
            )
            .unwrap();
        assert_eq!(total.value(&["find", "success", "docs", "users"]), 1.0);
    }

    #[test]
    fn unset_extra_label_records_empty_value() {
        let sink = MetricsSink::new();
        let cfg = InstrumentConfig {
            extra_labels: vec!["collection".to_string()],
            ..InstrumentConfig::default()
        };
        let instrumenter = Instrumenter::new(&cfg, Some(&sink)).unwrap();

        instrumenter.begin("find").finish(Outcome::Success);

        let total = sink
            .counter(
                "operations_total",
                "",
                &["operation", "status", "service", "collection"],
            )
            .unwrap();
        assert_eq!(total.value(&["find", "success", "default", ""]), 1.0);
    }

    #[test]
    fn undeclared_label_is_ignored() {
        let sink = MetricsSink::new();
        let instrumenter = Instrumenter::new(&config("cache"), Some(&sink)).unwrap();

        instrumenter
            .begin("get")
            .label("collection", "users")
            .finish(Outcome::Success);

        let total = sink
            .counter("operations_total", "", &["operation", "status", "service"])
            .unwrap();
        assert_eq!(total.value(&["get", "success", "cache"]), 1.0);
    }
}
