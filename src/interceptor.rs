use std::future::Future;

use async_trait::async_trait;

use crate::{Payload, RequestConfig, Result};

/// Transforms the resolved configuration once, before the first attempt.
///
/// Async closures of the shape `|config| async move { Ok(config) }`
/// implement this trait directly.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, config: RequestConfig) -> Result<RequestConfig>;
}

/// Transforms the decoded payload of a successful response.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept(&self, payload: Payload) -> Result<Payload>;
}

#[async_trait]
impl<F, Fut> RequestInterceptor for F
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
{
    async fn intercept(&self, config: RequestConfig) -> Result<RequestConfig> {
        (self)(config).await
    }
}

#[async_trait]
impl<F, Fut> ResponseInterceptor for F
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Payload>> + Send + 'static,
{
    async fn intercept(&self, payload: Payload) -> Result<Payload> {
        (self)(payload).await
    }
}
