//! Component error types

use thiserror::Error;

/// Errors raised by buffer write operations
///
/// Reads never fail: a timed-out or empty read yields an empty batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Buffer is at capacity and the write timed out
    #[error("buffer full, write timed out after {timeout_ms}ms")]
    WriteTimeout {
        /// How long the writer waited
        timeout_ms: u64,
    },

    /// A circuit breaker is open; the write was rejected without queuing
    #[error("write rejected: circuit breaker open")]
    CircuitOpen,
}

/// Errors raised when starting a source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source failed to start
    #[error("source failed to start: {0}")]
    Start(String),
}
