//! `resilient-api-client` is an async HTTP client that retries transient
//! failures.
//!
//! Every call goes through [`ApiClient::request`]:
//! - request interceptors run in registration order on each attempt
//! - each attempt gets its own timeout; expiry cancels the in-flight call
//! - statuses in [`RetryPolicy::retryable_statuses`] are retried with
//!   exponential backoff until [`RetryPolicy::max_attempts`] is reached
//! - the caller sees exactly one [`ApiResponse`] or one [`ApiClientError`]
//!
//! ```no_run
//! use resilient_api_client::{ApiClient, ClientOptions, RequestOptions};
//!
//! # async fn run() -> resilient_api_client::Result<()> {
//! let client = ApiClient::new(ClientOptions::default().with_base_url("https://api.example.com"))?;
//! let response = client.get("/agents", RequestOptions::new()).await?;
//! println!("{} {:?}", response.status, response.data);
//! # Ok(())
//! # }
//! ```

mod client;
mod decode;
mod error;
mod interceptor;
mod options;
mod retry;
mod sink;
mod transport;
mod types;

pub use client::{create_api_client, ApiClient};
pub use error::{ApiClientError, ErrorKind};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use options::ClientOptions;
pub use retry::{RetryPolicy, DEFAULT_RETRYABLE_STATUSES};
#[cfg(feature = "tracing")]
pub use sink::TracingSink;
pub use sink::{LogSink, NoopSink};
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportErrorKind, TransportResponse,
};
pub use types::{ApiResponse, RequestBody, RequestOptions, RequestSpec, ResponseBody, ResponseMeta};

pub use async_trait::async_trait;
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, ApiClientError>;
