//! Error types for the upstream bridge.
//!
//! Every failure the bridge can surface falls into one of four buckets:
//! transient upstream trouble (worth retrying), terminal client errors
//! (never retried), synthetic circuit-open rejections, and deduplication
//! wait timeouts. Callers match on the variant to decide messaging.

use std::time::Duration;
use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced by the resilience and caching core
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// The upstream service answered with a non-success status code
    #[error("Upstream error ({status_code}): {message}")]
    Upstream {
        /// HTTP status code returned by the upstream
        status_code: u16,
        /// Error message from the upstream response
        message: String,
    },

    /// Network-level failure before any response was received
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure
        message: String,
    },

    /// The upstream transport timed out
    #[error("Upstream timeout after {duration:?}")]
    Timeout {
        /// How long the request waited before timing out
        duration: Duration,
    },

    /// Request parameters failed validation before reaching the upstream
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the validation failure
        message: String,
    },

    /// The upstream response could not be parsed
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure
        message: String,
    },

    /// Rejected without contacting the upstream because the circuit is open
    #[error("Circuit breaker open for {service}")]
    CircuitOpen {
        /// The protected service the circuit guards
        service: String,
    },

    /// Gave up waiting for an in-flight duplicate of the same request
    #[error("Deduplication timeout for key '{key}' after {waited:?}")]
    DeduplicationTimeout {
        /// Cache key the caller was waiting on
        key: String,
        /// How long the caller waited
        waited: Duration,
    },

    /// Invalid configuration supplied at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Create a new upstream error
    pub fn upstream(status_code: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status_code,
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    #[must_use]
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new circuit-open rejection
    pub fn circuit_open(service: impl Into<String>) -> Self {
        Self::CircuitOpen {
            service: service.into(),
        }
    }

    /// Create a new deduplication timeout error
    pub fn deduplication_timeout(key: impl Into<String>, waited: Duration) -> Self {
        Self::DeduplicationTimeout {
            key: key.into(),
            waited,
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The upstream HTTP status code, if this error carries one
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Upstream { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Whether this is a network-level failure (connection or timeout)
    ///
    /// Network failures are always considered transient.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Whether this error was raised without contacting the upstream
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}
