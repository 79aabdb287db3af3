use async_trait::async_trait;

use crate::{RequestSpec, ResponseBody, ResponseMeta, Result};

/// Transforms the outgoing request before each physical attempt.
///
/// Every attempt starts from the same base request, so an interceptor sees
/// the untouched request again on retries.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, request: RequestSpec) -> Result<RequestSpec>;
}

/// Observes every completed response, retryable or final.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn observe(&self, response: &ResponseMeta, body: &ResponseBody);
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(RequestSpec) -> RequestSpec + Send + Sync,
{
    async fn intercept(&self, request: RequestSpec) -> Result<RequestSpec> {
        Ok(self(request))
    }
}

#[async_trait]
impl<F> ResponseInterceptor for F
where
    F: Fn(&ResponseMeta, &ResponseBody) + Send + Sync,
{
    async fn observe(&self, response: &ResponseMeta, body: &ResponseBody) {
        self(response, body)
    }
}
