//! opwrap - Instrumented operation envelopes for client wrappers
//!
//! This crate provides the glue that client wrappers share:
//! - An operation envelope that measures latency and outcome of delegated calls
//! - A metrics sink with memoized counter/histogram registration
//! - A driver-error taxonomy with pure string classification
//! - Configuration value types with documented defaults and explicit overrides
//! - An injectable logger handle (no ambient global state)

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod kv;
pub mod logging;
pub mod sink;

pub use config::{InstrumentConfig, InstrumentOverrides, KvConfig, LogConfig, LogOverrides};
pub use envelope::{Instrumenter, OperationContext, Outcome};
pub use error::{classify, Error, Result};
pub use kv::{BackendError, KvBackend, KvClient};
pub use logging::Logger;
pub use sink::{CounterHandle, HistogramHandle, MetricsSink};
