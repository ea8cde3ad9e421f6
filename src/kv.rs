//! Instrumented key-value client wrapper
//!
//! Reference integration of the operation envelope: a client that owns a
//! driver behind the [`KvBackend`] trait and runs every operation as
//! begin, delegate, finish, classify. Success values pass through untouched;
//! errors come back mapped into the crate taxonomy. The concrete driver
//! (connection pooling included) stays external.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{InstrumentConfig, KvConfig};
use crate::envelope::Instrumenter;
use crate::error::{classify, Error, Result};
use crate::sink::MetricsSink;

/// Raw error type surfaced by a backend driver
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Driver seam for the key-value client.
///
/// Implementations surface a missing key as an error (conventionally
/// "key not found"), the way drivers report it on the wire; the client maps
/// it into [`Error::NotFound`].
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn ping(&self) -> std::result::Result<(), BackendError>;
    async fn get(&self, key: &str) -> std::result::Result<String, BackendError>;
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> std::result::Result<(), BackendError>;
    async fn del(&self, keys: &[&str]) -> std::result::Result<u64, BackendError>;
    async fn exists(&self, keys: &[&str]) -> std::result::Result<u64, BackendError>;
}

/// Key-value client with per-operation instrumentation
#[derive(Debug)]
pub struct KvClient<B> {
    backend: B,
    config: KvConfig,
    instrument: Instrumenter,
}

impl<B: KvBackend> KvClient<B> {
    /// Wrap a backend without checking connectivity.
    ///
    /// `config.service` is the single source of the `service` label: it is
    /// stamped into the instrumentation settings here, overriding whatever
    /// `config.instrument.service` holds.
    pub fn new(backend: B, config: KvConfig, sink: Option<&MetricsSink>) -> Result<Self> {
        let instrument_config = InstrumentConfig {
            service: config.service.clone(),
            ..config.instrument.clone()
        };
        let instrument = Instrumenter::new(&instrument_config, sink)?;
        Ok(Self {
            backend,
            config,
            instrument,
        })
    }

    /// Wrap a backend and verify connectivity within `connect_timeout`.
    pub async fn connect(backend: B, config: KvConfig, sink: Option<&MetricsSink>) -> Result<Self> {
        let client = Self::new(backend, config, sink)?;
        match tokio::time::timeout(client.config.connect_timeout, client.backend.ping()).await {
            Ok(Ok(())) => Ok(client),
            Ok(Err(e)) => Err(classify("ping", &*e)),
            Err(_) => Err(Error::Timeout {
                op: "ping".to_string(),
            }),
        }
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    /// Fetch the value stored under `key`.
    pub async fn get(&self, key: &str) -> Result<String> {
        let ctx = self.instrument.begin("get");
        let result = self.backend.get(key).await;
        ctx.finish_result(&result);
        result.map_err(|e| classify("get", &*e))
    }

    /// Store `value` under `key`, optionally with a time to live.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let ctx = self.instrument.begin("set");
        let result = self.backend.set(key, value, ttl).await;
        ctx.finish_result(&result);
        result.map_err(|e| classify("set", &*e))
    }

    /// Delete the given keys, returning how many existed.
    pub async fn del(&self, keys: &[&str]) -> Result<u64> {
        let ctx = self.instrument.begin("del");
        let result = self.backend.del(keys).await;
        ctx.finish_result(&result);
        result.map_err(|e| classify("del", &*e))
    }

    /// Count how many of the given keys exist.
    pub async fn exists(&self, keys: &[&str]) -> Result<u64> {
        let ctx = self.instrument.begin("exists");
        let result = self.backend.exists(keys).await;
        ctx.finish_result(&result);
        result.map_err(|e| classify("exists", &*e))
    }
}
