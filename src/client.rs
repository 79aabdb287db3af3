use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tokio::time::{sleep, timeout};

use crate::{
    decode::{build_default_headers, decode_body, encode_body, merge_headers, JSON_CONTENT_TYPE},
    sink::default_sink,
    types::is_ok_status,
    ApiClientError, ApiResponse, ClientOptions, LogSink, ReqwestTransport, RequestBody,
    RequestInterceptor, RequestOptions, RequestSpec, ResponseBody, ResponseInterceptor,
    ResponseMeta, Result, Transport, TransportErrorKind, TransportResponse,
};

type RequestInterceptors = Arc<RwLock<Vec<Arc<dyn RequestInterceptor>>>>;
type ResponseInterceptors = Arc<RwLock<Vec<Arc<dyn ResponseInterceptor>>>>;

/// Builds a client from options. Same as [`ApiClient::new`].
pub fn create_api_client(options: ClientOptions) -> Result<ApiClient> {
    ApiClient::new(options)
}

#[derive(Clone)]
/// HTTP client that retries retryable statuses with exponential backoff.
///
/// Clones share configuration and interceptor lists; `add_*_interceptor` on
/// any clone is seen by all of them. The `with_*` builders fork the list.
pub struct ApiClient {
    options: Arc<ClientOptions>,
    default_headers: Arc<HeaderMap>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn LogSink>,
    request_interceptors: RequestInterceptors,
    response_interceptors: ResponseInterceptors,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .default_headers
            .iter()
            .map(|(name, value)| {
                let shown = if *name == AUTHORIZATION {
                    "<redacted>"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                (name.as_str(), shown)
            })
            .collect();

        f.debug_struct("ApiClient")
            .field("base_url", &self.options.base_url)
            .field("headers", &headers)
            .field("timeout", &self.options.timeout)
            .field("retry", &self.options.retry)
            .field("request_interceptors", &read_list(&self.request_interceptors).len())
            .field("response_interceptors", &read_list(&self.response_interceptors).len())
            .finish()
    }
}

impl ApiClient {
    /// Creates a client using the `reqwest` transport.
    ///
    /// Fails when the timeout is zero, the retry policy is out of range, or a
    /// default header cannot be represented.
    pub fn new(options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let default_headers = build_default_headers(&options.headers)?;
        Ok(Self {
            options: Arc::new(options),
            default_headers: Arc::new(default_headers),
            transport: Arc::new(ReqwestTransport::new()),
            sink: default_sink(),
            request_interceptors: Arc::default(),
            response_interceptors: Arc::default(),
        })
    }

    /// Replaces the network transport.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replaces the sink receiving retry decisions.
    pub fn with_sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Returns a client whose request interceptors are the current ones plus
    /// `interceptor`. Clones made earlier are unaffected.
    pub fn with_request_interceptor<I: RequestInterceptor + 'static>(
        mut self,
        interceptor: I,
    ) -> Self {
        let mut list = read_list(&self.request_interceptors);
        list.push(Arc::new(interceptor));
        self.request_interceptors = Arc::new(RwLock::new(list));
        self
    }

    /// Returns a client whose response interceptors are the current ones plus
    /// `interceptor`. Clones made earlier are unaffected.
    pub fn with_response_interceptor<I: ResponseInterceptor + 'static>(
        mut self,
        interceptor: I,
    ) -> Self {
        let mut list = read_list(&self.response_interceptors);
        list.push(Arc::new(interceptor));
        self.response_interceptors = Arc::new(RwLock::new(list));
        self
    }

    /// Appends a request interceptor. Safe to call while requests are in flight;
    /// they pick it up from their next attempt.
    pub fn add_request_interceptor<I: RequestInterceptor + 'static>(&self, interceptor: I) {
        self.add_request_interceptor_arc(Arc::new(interceptor));
    }

    /// Appends an already shared request interceptor.
    pub fn add_request_interceptor_arc(&self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request_interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    /// Appends a response interceptor.
    pub fn add_response_interceptor<I: ResponseInterceptor + 'static>(&self, interceptor: I) {
        self.add_response_interceptor_arc(Arc::new(interceptor));
    }

    /// Appends an already shared response interceptor.
    pub fn add_response_interceptor_arc(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response_interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    /// Options the client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends a `GET` request.
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(endpoint, options.method(Method::GET)).await
    }

    /// Sends a `DELETE` request.
    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(endpoint, options.method(Method::DELETE)).await
    }

    /// Sends a `POST` with `body` serialized as JSON.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let options = with_json_body(options.method(Method::POST), body)?;
        self.request(endpoint, options).await
    }

    /// Sends a `PUT` with `body` serialized as JSON.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let options = with_json_body(options.method(Method::PUT), body)?;
        self.request(endpoint, options).await
    }

    /// Sends a `PATCH` with `body` serialized as JSON.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let options = with_json_body(options.method(Method::PATCH), body)?;
        self.request(endpoint, options).await
    }

    /// Executes a request, retrying retryable statuses.
    ///
    /// Returns one result per call: the first non-retryable response
    /// (including error statuses, with `ok == false`), or the terminal error.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        let url = resolve_url(&self.options.base_url, endpoint);
        let base = self.build_request(url, options)?;
        self.send_with_retry(base).await
    }

    fn build_request(&self, url: String, options: RequestOptions) -> Result<RequestSpec> {
        let mut headers = merge_headers(&self.default_headers, &options.headers)?;
        let body = options
            .body
            .map(|body| encode_body(body, &mut headers))
            .transpose()?;

        Ok(RequestSpec {
            method: options.method,
            url,
            headers,
            body,
        })
    }

    async fn send_with_retry(&self, base: RequestSpec) -> Result<ApiResponse> {
        let policy = &self.options.retry;
        let max_attempts = policy.max_attempts;

        for attempt in 1..=max_attempts {
            #[cfg(feature = "tracing")]
            tracing::trace!(method = %base.method, url = %base.url, attempt, "sending request");

            let spec = self.intercept_request(base.clone()).await?;
            let response = self.perform_with_timeout(&spec).await?;
            let data = decode_body(response.status, &response.headers, &response.body)?;

            let meta = ResponseMeta {
                status: response.status,
                headers: response.headers,
                url: spec.url,
                attempt,
            };
            self.observe_response(&meta, &data).await;

            if !policy.is_retryable_status(meta.status) {
                return Ok(ApiResponse {
                    ok: is_ok_status(meta.status),
                    status: meta.status,
                    headers: meta.headers,
                    data,
                });
            }

            if attempt == max_attempts {
                return Err(ApiClientError::RetriesExhausted {
                    status: meta.status,
                    attempts: attempt,
                    body: data,
                });
            }

            let delay = policy.delay_after(attempt);
            // `delay_ms` in the data is floored; the message keeps fractions.
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            let exact_ms = delay.as_nanos() as f64 / 1_000_000.0;
            self.sink.debug(
                &format!(
                    "Retryable error: Request failed with status {}. Retrying in {exact_ms}ms (attempt {attempt}/{max_attempts})",
                    meta.status
                ),
                Some(&json!({
                    "status": meta.status,
                    "delay_ms": delay_ms,
                    "attempt": attempt,
                    "max_attempts": max_attempts,
                })),
            );
            sleep(delay).await;
        }

        Err(ApiClientError::InvalidConfig(
            "max_attempts must be at least 1".to_owned(),
        ))
    }

    async fn intercept_request(&self, mut spec: RequestSpec) -> Result<RequestSpec> {
        for interceptor in read_list(&self.request_interceptors) {
            spec = interceptor.intercept(spec).await?;
        }
        Ok(spec)
    }

    async fn observe_response(&self, meta: &ResponseMeta, data: &ResponseBody) {
        for interceptor in read_list(&self.response_interceptors) {
            interceptor.observe(meta, data).await;
        }
    }

    /// Runs one physical attempt; expiry drops the transport future.
    async fn perform_with_timeout(&self, spec: &RequestSpec) -> Result<TransportResponse> {
        let limit = self.options.timeout;
        match timeout(limit, self.transport.perform(spec)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) if err.kind() == TransportErrorKind::Aborted => {
                Err(ApiClientError::Timeout { timeout: limit })
            }
            Ok(Err(err)) => Err(ApiClientError::Transport(err)),
            Err(_elapsed) => Err(ApiClientError::Timeout { timeout: limit }),
        }
    }
}

/// Absolute endpoints are used verbatim; anything else is appended to the
/// base URL without inserting a separator.
pub(crate) fn resolve_url(base_url: &str, endpoint: &str) -> String {
    if is_absolute(endpoint) {
        endpoint.to_owned()
    } else {
        format!("{base_url}{endpoint}")
    }
}

fn is_absolute(endpoint: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        endpoint
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn with_json_body<B: Serialize + ?Sized>(
    mut options: RequestOptions,
    body: &B,
) -> Result<RequestOptions> {
    let encoded = serde_json::to_vec(body)?;
    let has_content_type = options
        .headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
    if !has_content_type {
        options
            .headers
            .push((CONTENT_TYPE.as_str().to_owned(), JSON_CONTENT_TYPE.to_owned()));
    }
    Ok(options.body(RequestBody::Bytes(encoded)))
}

fn read_list<T: ?Sized>(list: &Arc<RwLock<Vec<Arc<T>>>>) -> Vec<Arc<T>> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}
