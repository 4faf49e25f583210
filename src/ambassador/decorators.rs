//! Composable wrappers around any [`RemoteCaller`].

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

use crate::ambassador::RemoteCaller;
use crate::cache::ResponseCache;
use crate::config::CacheConfig;
use crate::error::{AmbassadorResult, OperationError};
use crate::load_balancer::EndpointStatus;
use crate::observability::MetricsSnapshot;

/// Logs every call with its duration and outcome.
#[derive(Debug)]
pub struct LoggingCaller<C> {
    inner: C,
}

impl<C: RemoteCaller> LoggingCaller<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: RemoteCaller> RemoteCaller for LoggingCaller<C> {
    async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> AmbassadorResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, OperationError>> + Send,
    {
        tracing::info!(operation = %name, "Call started");
        let started = Instant::now();
        let result = self.inner.execute(name, operation).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => tracing::info!(operation = %name, elapsed = ?elapsed, "Call completed"),
            Err(e) => tracing::warn!(operation = %name, elapsed = ?elapsed, error = %e, "Call failed"),
        }
        result
    }

    fn endpoint_status(&self) -> Vec<EndpointStatus> {
        self.inner.endpoint_status()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }
}

/// Serves repeated calls from a [`ResponseCache`] keyed by operation name.
///
/// Only successful results are cached.
#[derive(Debug)]
pub struct CachingCaller<C> {
    inner: C,
    cache: Arc<ResponseCache>,
}

impl<C: RemoteCaller> CachingCaller<C> {
    pub fn new(inner: C, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    /// Wrap `inner` with a fresh cache when `[cache]` is enabled.
    pub fn from_config(inner: C, config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(inner, Arc::new(ResponseCache::from_config(config))))
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[async_trait]
impl<C: RemoteCaller> RemoteCaller for CachingCaller<C> {
    async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> AmbassadorResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, OperationError>> + Send,
    {
        if let Some(hit) = self.cache.get::<T>(name) {
            tracing::debug!(operation = %name, "Served from cache");
            return Ok(hit);
        }

        let value = self.inner.execute(name, operation).await?;
        self.cache.insert(name, value.clone());
        Ok(value)
    }

    fn endpoint_status(&self) -> Vec<EndpointStatus> {
        self.inner.endpoint_status()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }
}
