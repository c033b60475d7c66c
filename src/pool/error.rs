//! Pool error definitions.

use thiserror::Error;

use crate::net::transport::TransportError;

/// Errors surfaced by the connection pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A backend could not be reached while building the pool.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: TransportError,
    },

    /// The target domain could not be resolved while building the pool.
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Nothing eligible to hand out right now. Retryable.
    #[error("no active connections found")]
    NoActiveConnections,

    /// The pool has been shut down.
    #[error("connection pool is closed")]
    Closed,
}

impl PoolError {
    /// Whether a caller may retry the request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::NoActiveConnections)
    }
}
