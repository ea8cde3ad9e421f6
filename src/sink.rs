//! Metrics sink for opwrap
//!
//! A [`MetricsSink`] owns a private Prometheus registry plus memoized
//! counter/histogram families keyed by metric name. Registering the same name
//! twice returns a handle to the same underlying family, so call sites never
//! have to coordinate who registers first.
//!
//! Handles never panic: a label-value slice whose arity does not match the
//! registered label names drops the sample with a warning. Label names are
//! validated once, at registration.

use std::collections::HashMap;

use parking_lot::RwLock;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

use crate::error::{Error, Result};

/// Process-wide metrics sink with memoized series registration
pub struct MetricsSink {
    registry: Registry,
    counters: RwLock<HashMap<String, CounterHandle>>,
    histograms: RwLock<HashMap<String, HistogramHandle>>,
}

impl MetricsSink {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            counters: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
        }
    }

    /// Create or fetch a counter family.
    ///
    /// The first call for a name registers the family; later calls return the
    /// memoized handle and ignore `help` and `label_names`.
    pub fn counter(&self, name: &str, help: &str, label_names: &[&str]) -> Result<CounterHandle> {
        if let Some(handle) = self.counters.read().get(name) {
            return Ok(handle.clone());
        }

        validate_label_names(name, label_names)?;

        let mut counters = self.counters.write();
        // lost the registration race to another caller
        if let Some(handle) = counters.get(name) {
            return Ok(handle.clone());
        }

        let vec = CounterVec::new(Opts::new(name, help), label_names)
            .map_err(|e| Error::Config(format!("counter {name}: {e}")))?;
        self.registry
            .register(Box::new(vec.clone()))
            .map_err(|e| Error::Config(format!("counter {name}: {e}")))?;

        let handle = CounterHandle {
            vec,
            name: name.to_string(),
            arity: label_names.len(),
        };
        counters.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Create or fetch a histogram family.
    ///
    /// Memoized by name, like [`MetricsSink::counter`].
    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<HistogramHandle> {
        if let Some(handle) = self.histograms.read().get(name) {
            return Ok(handle.clone());
        }

        validate_label_names(name, label_names)?;

        let mut histograms = self.histograms.write();
        if let Some(handle) = histograms.get(name) {
            return Ok(handle.clone());
        }

        let opts = HistogramOpts::new(name, help).buckets(buckets.to_vec());
        let vec = HistogramVec::new(opts, label_names)
            .map_err(|e| Error::Config(format!("histogram {name}: {e}")))?;
        self.registry
            .register(Box::new(vec.clone()))
            .map_err(|e| Error::Config(format!("histogram {name}: {e}")))?;

        let handle = HistogramHandle {
            vec,
            name: name.to_string(),
            arity: label_names.len(),
        };
        histograms.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Export all series in the Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("failed to encode metrics: {e}");
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_label_names(metric: &str, label_names: &[&str]) -> Result<()> {
    for (i, name) in label_names.iter().enumerate() {
        if name.is_empty() {
            return Err(Error::Config(format!(
                "metric {metric}: empty label name at position {i}"
            )));
        }
        if label_names[..i].contains(name) {
            return Err(Error::Config(format!(
                "metric {metric}: duplicate label name {name}"
            )));
        }
    }
    Ok(())
}

/// Handle to a registered counter family
#[derive(Clone, Debug)]
pub struct CounterHandle {
    vec: CounterVec,
    name: String,
    arity: usize,
}

impl CounterHandle {
    /// Increment the series addressed by `label_values` by one.
    ///
    /// A value slice of the wrong arity drops the increment with a warning.
    pub fn increment(&self, label_values: &[&str]) {
        match self.vec.get_metric_with_label_values(label_values) {
            Ok(counter) => counter.inc(),
            Err(e) => tracing::warn!(
                metric = %self.name,
                expected = self.arity,
                got = label_values.len(),
                "dropped counter increment: {e}"
            ),
        }
    }

    /// Current value of the series addressed by `label_values`.
    pub fn value(&self, label_values: &[&str]) -> f64 {
        self.vec
            .get_metric_with_label_values(label_values)
            .map_or(0.0, |counter| counter.get())
    }
}

/// Handle to a registered histogram family
#[derive(Clone, Debug)]
pub struct HistogramHandle {
    vec: HistogramVec,
    name: String,
    arity: usize,
}

impl HistogramHandle {
    /// Record one observation against the series addressed by `label_values`.
    ///
    /// A value slice of the wrong arity drops the observation with a warning.
    pub fn observe(&self, label_values: &[&str], value: f64) {
        match self.vec.get_metric_with_label_values(label_values) {
            Ok(histogram) => histogram.observe(value),
            Err(e) => tracing::warn!(
                metric = %self.name,
                expected = self.arity,
                got = label_values.len(),
                "dropped histogram observation: {e}"
            ),
        }
    }

    /// Number of observations recorded against the addressed series.
    pub fn sample_count(&self, label_values: &[&str]) -> u64 {
        self.vec
            .get_metric_with_label_values(label_values)
            .map_or(0, |histogram| histogram.get_sample_count())
    }

    /// Sum of observations recorded against the addressed series.
    pub fn sample_sum(&self, label_values: &[&str]) -> f64 {
        self.vec
            .get_metric_with_label_values(label_values)
            .map_or(0.0, |histogram| histogram.get_sample_sum())
    }
}
