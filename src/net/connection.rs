//! Connection handles and their identifiers.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track per-handle lifecycle timestamps (created, last used)
//! - Mark exclusive use while a handle is acquired

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Unique identifier for a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Hands out connection IDs for one pool.
/// Relaxed ordering is enough; only uniqueness matters.
#[derive(Debug)]
pub struct ConnectionIdGenerator(AtomicU64);

impl ConnectionIdGenerator {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A reusable connection slot owned by the pool.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    created_at: Instant,
    last_used_at: Instant,
    in_use: bool,
}

impl ConnectionHandle {
    /// A freshly created handle, already marked in use.
    pub fn new(id: ConnectionId, now: Instant) -> Self {
        Self {
            id,
            created_at: now,
            last_used_at: now,
            in_use: true,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_used_at(&self) -> Instant {
        self.last_used_at
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Idle for at least `max_idle` as of `now`.
    pub fn is_stale(&self, now: Instant, max_idle: Duration) -> bool {
        !self.in_use && now.saturating_duration_since(self.last_used_at) >= max_idle
    }

    pub(crate) fn checkout(&mut self) {
        self.in_use = true;
    }

    pub(crate) fn checkin(&mut self, now: Instant) {
        self.in_use = false;
        self.last_used_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let ids = ConnectionIdGenerator::new();
        let id1 = ids.next();
        let id2 = ids.next();
        assert_ne!(id1, id2);
        assert_eq!(id1.to_string(), "conn-1");
        assert_eq!(id2.as_u64(), 2);
    }

    #[test]
    fn handle_staleness() {
        let now = Instant::now();
        let mut handle = ConnectionHandle::new(ConnectionIdGenerator::new().next(), now);
        let idle = Duration::from_secs(60);

        // In use is never stale.
        assert!(!handle.is_stale(now + Duration::from_secs(600), idle));

        handle.checkin(now);
        assert!(!handle.is_stale(now + Duration::from_secs(59), idle));
        assert!(handle.is_stale(now + Duration::from_secs(60), idle));
        assert_eq!(handle.created_at(), now);
    }
}
