//! Per-call spans.

use tracing::Span;
use uuid::Uuid;

/// Span wrapping one `execute` call; every attempt logs inside it.
pub fn request_span(operation: &str) -> Span {
    tracing::info_span!(
        "ambassador_call",
        request_id = %Uuid::new_v4(),
        operation = %operation,
    )
}
