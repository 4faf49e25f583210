//! The remote-call capability shared by the ambassador and its decorators.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::ambassador::Ambassador;
use crate::error::{AmbassadorResult, OperationError};
use crate::load_balancer::EndpointStatus;
use crate::observability::MetricsSnapshot;

/// Something that can run an operation against a remote endpoint.
///
/// Decorators wrap any implementation and add behaviour around `execute`.
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    /// Run `operation` with the address of a selected endpoint.
    async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> AmbassadorResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, OperationError>> + Send;

    fn endpoint_status(&self) -> Vec<EndpointStatus>;

    fn metrics(&self) -> MetricsSnapshot;
}

#[async_trait]
impl RemoteCaller for Ambassador {
    async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> AmbassadorResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, OperationError>> + Send,
    {
        Ambassador::execute(self, name, operation).await
    }

    fn endpoint_status(&self) -> Vec<EndpointStatus> {
        Ambassador::endpoint_status(self)
    }

    fn metrics(&self) -> MetricsSnapshot {
        Ambassador::metrics(self)
    }
}

#[async_trait]
impl<C: RemoteCaller> RemoteCaller for Arc<C> {
    async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> AmbassadorResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, OperationError>> + Send,
    {
        C::execute(self, name, operation).await
    }

    fn endpoint_status(&self) -> Vec<EndpointStatus> {
        C::endpoint_status(self)
    }

    fn metrics(&self) -> MetricsSnapshot {
        C::metrics(self)
    }
}
