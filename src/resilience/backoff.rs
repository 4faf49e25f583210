//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate the delay before retry `attempt` (1-indexed).
///
/// Exponential mode doubles `base` per retry, caps at `max` and adds
/// 0–10% jitter. Constant mode always returns `base`.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration, exponential: bool) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }
    if !exponential {
        return base;
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
