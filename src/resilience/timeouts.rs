//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each attempt with a deadline
//! - Abort the in-flight operation on timeout or cancellation
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from operation errors
//! - Cancellation wins over a simultaneously completing operation

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{AmbassadorError, AmbassadorResult, OperationError};

/// Run one attempt under `limit`, aborting early if `cancel` fires.
pub async fn run_with_timeout<T, Fut>(limit: Duration, cancel: &CancellationToken, operation: Fut) -> AmbassadorResult<T>
where
    Fut: Future<Output = Result<T, OperationError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AmbassadorError::Cancelled),
        result = tokio::time::timeout(limit, operation) => match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AmbassadorError::Operation(e)),
            Err(_) => Err(AmbassadorError::Timeout(limit)),
        },
    }
}
