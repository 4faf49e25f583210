//! Error taxonomy for the ambassador.
//!
//! # Propagation
//! ```text
//! Operation / Timeout / NoHealthyEndpoints / PoolExhausted
//!     → handled by the retry loop, never escape on their own
//! RetriesExhausted
//!     → terminal, wraps the last cause and the attempt count
//! InvalidConfiguration
//!     → construction time only
//! Cancelled
//!     → caller aborted via its cancellation token
//! ```

use std::time::Duration;
use thiserror::Error;

/// Failure reported by the wrapped remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    retryable: bool,
}

impl OperationError {
    /// A failure worth retrying (network blip, 5xx, timeout on the far side).
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure that will not go away by retrying (bad request, auth).
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl From<std::io::Error> for OperationError {
    fn from(err: std::io::Error) -> Self {
        Self::transient(err.to_string())
    }
}

/// Errors surfaced by the ambassador and its components.
#[derive(Debug, Clone, Error)]
pub enum AmbassadorError {
    #[error("operation failed: {0}")]
    Operation(#[from] OperationError),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("no healthy endpoints available")]
    NoHealthyEndpoints,

    #[error("connection pool exhausted ({max_connections} connections in use)")]
    PoolExhausted { max_connections: usize },

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<AmbassadorError>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl AmbassadorError {
    /// Whether the retry loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            AmbassadorError::Operation(e) => e.is_retryable(),
            AmbassadorError::Timeout(_)
            | AmbassadorError::NoHealthyEndpoints
            | AmbassadorError::PoolExhausted { .. } => true,
            AmbassadorError::RetriesExhausted { .. }
            | AmbassadorError::InvalidConfiguration(_)
            | AmbassadorError::Cancelled => false,
        }
    }

    /// Attempts made, when this is a terminal retry failure.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            AmbassadorError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// The underlying cause of the last attempt.
    pub fn root_cause(&self) -> &AmbassadorError {
        match self {
            AmbassadorError::RetriesExhausted { last_error, .. } => last_error.root_cause(),
            other => other,
        }
    }
}

/// Result type for ambassador operations.
pub type AmbassadorResult<T> = Result<T, AmbassadorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(AmbassadorError::NoHealthyEndpoints.is_retryable());
        assert!(AmbassadorError::PoolExhausted { max_connections: 2 }.is_retryable());
        assert!(AmbassadorError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(AmbassadorError::from(OperationError::transient("reset")).is_retryable());
        assert!(!AmbassadorError::from(OperationError::permanent("bad request")).is_retryable());
        assert!(!AmbassadorError::Cancelled.is_retryable());
    }

    #[test]
    fn test_root_cause_and_display() {
        let err = AmbassadorError::RetriesExhausted {
            attempts: 4,
            last_error: Box::new(OperationError::transient("connection refused").into()),
        };
        assert_eq!(err.attempts(), Some(4));
        assert!(matches!(err.root_cause(), AmbassadorError::Operation(_)));
        assert_eq!(
            err.to_string(),
            "retries exhausted after 4 attempts: operation failed: connection refused"
        );
    }
}
