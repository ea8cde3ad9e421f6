//! Error types for opwrap
//!
//! Provides the wrapper-side error taxonomy and the classification of raw
//! driver errors into it. Classification is pure string/type matching and is
//! deliberately separate from instrumentation: the envelope only observes
//! whether an error occurred, never which kind.

use thiserror::Error;

/// Result type alias using opwrap's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper-side error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {op}")]
    NotFound { op: String },

    #[error("operation timeout: {op}")]
    Timeout { op: String },

    #[error("connection refused: {op}")]
    ConnectionRefused { op: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error in {op}: {message}")]
    Server { op: String, message: String },
}

impl Error {
    /// The operation that produced this error, when one was recorded.
    pub fn op(&self) -> Option<&str> {
        match self {
            Error::NotFound { op }
            | Error::Timeout { op }
            | Error::ConnectionRefused { op }
            | Error::Server { op, .. } => Some(op),
            Error::InvalidArgument(_) | Error::Config(_) => None,
        }
    }
}

/// Map a raw driver error into the taxonomy.
///
/// Drivers surface missing keys, refused connections and deadline overruns as
/// opaque errors with conventional message text. Matching stays coarse on
/// purpose: anything unrecognized is a server error carrying the original
/// message.
pub fn classify(op: &str, err: &(dyn std::error::Error + 'static)) -> Error {
    let message = err.to_string();
    let lower = message.to_lowercase();

    if lower.contains("not found") || lower.contains("no rows") {
        return Error::NotFound { op: op.to_string() };
    }

    if lower.contains("connection refused") {
        return Error::ConnectionRefused { op: op.to_string() };
    }

    if lower.contains("timeout") || lower.contains("timed out") {
        return Error::Timeout { op: op.to_string() };
    }

    Error::Server {
        op: op.to_string(),
        message,
    }
}
