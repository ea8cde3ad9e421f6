//! Configuration management for opwrap
//!
//! Every configuration type is a plain value struct whose `Default` impl
//! carries the documented defaults. Caller overrides go through an explicit
//! `merge` step: an overrides struct with `Option` fields, applied over the
//! defaults, so an unset field always means "keep the default" rather than
//! "zero value".

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default histogram bucket boundaries for operation latency, in seconds.
pub const DEFAULT_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0];

/// Per-client instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Whether operation metrics are recorded at all
    pub enabled: bool,
    /// Value of the `service` label on every series
    pub service: String,
    /// Name of the duration histogram
    pub duration_metric: String,
    /// Name of the operation counter
    pub counter_metric: String,
    /// Bucket boundaries for the duration histogram, in seconds
    pub buckets: Vec<f64>,
    /// Extra label names beyond (operation, status, service), in the order
    /// their values are supplied per operation
    pub extra_labels: Vec<String>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service: "default".to_string(),
            duration_metric: "operation_duration_seconds".to_string(),
            counter_metric: "operations_total".to_string(),
            buckets: DEFAULT_BUCKETS.to_vec(),
            extra_labels: Vec::new(),
        }
    }
}

/// Caller overrides for [`InstrumentConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentOverrides {
    pub enabled: Option<bool>,
    pub service: Option<String>,
    pub duration_metric: Option<String>,
    pub counter_metric: Option<String>,
    pub buckets: Option<Vec<f64>>,
    pub extra_labels: Option<Vec<String>>,
}

impl InstrumentConfig {
    /// Apply caller overrides over this configuration.
    #[must_use]
    pub fn merge(mut self, overrides: InstrumentOverrides) -> Self {
        if let Some(enabled) = overrides.enabled {
            self.enabled = enabled;
        }
        if let Some(service) = overrides.service {
            self.service = service;
        }
        if let Some(duration_metric) = overrides.duration_metric {
            self.duration_metric = duration_metric;
        }
        if let Some(counter_metric) = overrides.counter_metric {
            self.counter_metric = counter_metric;
        }
        if let Some(buckets) = overrides.buckets {
            self.buckets = buckets;
        }
        if let Some(extra_labels) = overrides.extra_labels {
            self.extra_labels = extra_labels;
        }
        self
    }
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level directive, e.g. `info` or `opwrap=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Service name recorded with the logger handle
    pub service: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            service: "default".to_string(),
        }
    }
}

/// Caller overrides for [`LogConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogOverrides {
    pub level: Option<String>,
    pub json: Option<bool>,
    pub service: Option<String>,
}

impl LogConfig {
    /// Apply caller overrides over this configuration.
    #[must_use]
    pub fn merge(mut self, overrides: LogOverrides) -> Self {
        if let Some(level) = overrides.level {
            self.level = level;
        }
        if let Some(json) = overrides.json {
            self.json = json;
        }
        if let Some(service) = overrides.service {
            self.service = service;
        }
        self
    }
}

/// Key-value client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvConfig {
    /// Service name; the single source of the `service` label value on this
    /// client's metrics, overriding `instrument.service` at construction
    pub service: String,
    /// Deadline for the connectivity check at construction
    pub connect_timeout: Duration,
    /// Instrumentation settings for this client
    pub instrument: InstrumentConfig,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            service: "kv".to_string(),
            connect_timeout: Duration::from_secs(5),
            instrument: InstrumentConfig {
                duration_metric: "kv_operation_duration_seconds".to_string(),
                counter_metric: "kv_operations_total".to_string(),
                ..InstrumentConfig::default()
            },
        }
    }
}
