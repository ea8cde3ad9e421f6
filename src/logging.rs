//! Logger handle for opwrap
//!
//! The logger is an explicit value, not a process-wide singleton: components
//! that log receive a [`Logger`] (or run inside [`Logger::scope`]), and the
//! application decides once, at the top, whether to install it globally.
//! Re-installation is an error rather than a silent no-op.
//!
//! Every scope runs inside a span carrying the configured service name, so
//! emitted lines are attributable to the owning service.
//!
//! Log rotation is an external concern; output goes to stderr.

use tracing::dispatcher::{self, Dispatch};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Handle to a configured tracing dispatcher
pub struct Logger {
    dispatch: Dispatch,
    service: String,
}

impl Logger {
    /// Build a logger from configuration, writing to stderr.
    ///
    /// The level field is an env-filter directive, so both plain levels
    /// (`info`) and per-target directives (`opwrap=debug`) work.
    pub fn new(config: &LogConfig) -> Result<Self> {
        Self::with_writer(config, std::io::stderr as fn() -> std::io::Stderr)
    }

    /// Build a logger with a caller-supplied writer (test capture buffers,
    /// pipes). Same configuration handling as [`Logger::new`].
    pub fn with_writer<W>(config: &LogConfig, writer: W) -> Result<Self>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Config(format!("invalid log level {:?}: {e}", config.level)))?;

        let dispatch = if config.json {
            Dispatch::new(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .json()
                    .finish(),
            )
        } else {
            Dispatch::new(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .finish(),
            )
        };

        Ok(Self {
            dispatch,
            service: config.service.clone(),
        })
    }

    /// The configured service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// A span carrying the service field.
    ///
    /// [`Logger::scope`] enters it automatically; components logging from
    /// their own threads or tasks after [`Logger::install_global`] enter it
    /// themselves to keep their events attributed.
    pub fn service_span(&self) -> tracing::Span {
        tracing::info_span!("service", service = %self.service)
    }

    /// Run `f` with this logger as the default dispatcher, inside the
    /// service span.
    ///
    /// This is the injection seam for tests and for components that must not
    /// touch global state.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, || {
            let span = self.service_span();
            let _enter = span.enter();
            f()
        })
    }

    /// Install this logger as the process-wide default.
    ///
    /// Fails if a global dispatcher is already set; initialization happens
    /// exactly once and the caller is told when it did not.
    pub fn install_global(&self) -> Result<()> {
        dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| Error::Config("global logger already installed".to_string()))
    }
}
