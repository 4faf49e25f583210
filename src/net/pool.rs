//! Bounded connection pool.
//!
//! # Responsibilities
//! - Cap live connection handles at `max_connections`
//! - Reuse idle handles younger than `max_idle_time`
//! - Fail fast, or wait up to `acquire_timeout`, when at capacity
//! - Evict stale idle handles
//!
//! # Design Decisions
//! - Release never destroys a handle; reuse is the point of the pool
//! - RAII guard guarantees release on every exit path
//! - Waiters are woken through `Notify`, not by polling

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;

use crate::clock::{deadline_after, Clock};
use crate::config::PoolConfig;
use crate::error::AmbassadorError;
use crate::net::connection::{ConnectionHandle, ConnectionId, ConnectionIdGenerator};

/// Pool failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("connection pool exhausted ({max_connections} connections in use)")]
    Exhausted { max_connections: usize },
}

impl From<PoolError> for AmbassadorError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { max_connections } => AmbassadorError::PoolExhausted { max_connections },
        }
    }
}

/// Pool limits.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: usize,
    pub max_idle_time: Duration,
    /// `None` fails fast at capacity.
    pub acquire_timeout: Option<Duration>,
}

impl From<&PoolConfig> for PoolSettings {
    fn from(config: &PoolConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            max_idle_time: config.max_idle_time(),
            acquire_timeout: config.acquire_timeout(),
        }
    }
}

/// Pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub in_use: usize,
    pub idle: usize,
    pub max_connections: usize,
}

/// Reusable, bounded set of connection handles.
#[derive(Debug)]
pub struct ConnectionPool {
    settings: PoolSettings,
    handles: Mutex<Vec<ConnectionHandle>>,
    ids: ConnectionIdGenerator,
    released: Notify,
    clock: Arc<dyn Clock>,
}

impl ConnectionPool {
    pub fn new(settings: PoolSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            handles: Mutex::new(Vec::new()),
            ids: ConnectionIdGenerator::new(),
            released: Notify::new(),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ConnectionHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire without waiting.
    pub fn try_acquire(&self) -> Result<PooledConnection<'_>, PoolError> {
        let now = self.clock.now();
        let max_idle = self.settings.max_idle_time;
        let mut handles = self.lock();

        // Reuse an idle handle that is still fresh.
        if let Some(handle) = handles.iter_mut().find(|h| !h.in_use() && !h.is_stale(now, max_idle)) {
            handle.checkout();
            return Ok(PooledConnection { pool: self, id: handle.id() });
        }

        // Stale idle handles only occupy slots.
        handles.retain(|h| !h.is_stale(now, max_idle));

        if handles.len() < self.settings.max_connections {
            let handle = ConnectionHandle::new(self.ids.next(), now);
            let id = handle.id();
            handles.push(handle);
            tracing::trace!(connection_id = %id, total = handles.len(), "Connection created");
            return Ok(PooledConnection { pool: self, id });
        }

        tracing::debug!(max_connections = self.settings.max_connections, "Connection pool exhausted");
        Err(PoolError::Exhausted {
            max_connections: self.settings.max_connections,
        })
    }

    /// Acquire a handle, waiting up to `acquire_timeout` when configured.
    pub async fn acquire(&self) -> Result<PooledConnection<'_>, PoolError> {
        let Some(timeout) = self.settings.acquire_timeout else {
            return self.try_acquire();
        };

        let deadline = deadline_after(tokio::time::Instant::now(), timeout);
        loop {
            // Register interest before checking so a release in between is not lost.
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_acquire() {
                Ok(conn) => return Ok(conn),
                Err(err) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Return a handle to the pool. The handle stays alive for reuse.
    pub fn release(&self, id: ConnectionId) {
        let now = self.clock.now();
        let mut handles = self.lock();
        if let Some(handle) = handles.iter_mut().find(|h| h.id() == id) {
            handle.checkin(now);
        }
        drop(handles);
        self.released.notify_one();
    }

    /// Evict idle handles older than `max_idle_time`. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let max_idle = self.settings.max_idle_time;
        let mut handles = self.lock();
        let before = handles.len();
        handles.retain(|h| !h.is_stale(now, max_idle));
        let evicted = before - handles.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = handles.len(), "Evicted idle connections");
        }
        evicted
    }

    pub fn stats(&self) -> PoolStats {
        let handles = self.lock();
        let in_use = handles.iter().filter(|h| h.in_use()).count();
        PoolStats {
            total: handles.len(),
            in_use,
            idle: handles.len() - in_use,
            max_connections: self.settings.max_connections,
        }
    }

    /// Copies of every handle, for inspection.
    pub fn handles(&self) -> Vec<ConnectionHandle> {
        self.lock().clone()
    }
}

/// A handle checked out of the pool; released on drop.
#[derive(Debug)]
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    id: ConnectionId,
}

impl PooledConnection<'_> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        self.pool.release(self.id);
    }
}
