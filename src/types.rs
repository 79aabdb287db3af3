use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::{ApiClientError, Result};

/// Body supplied by the caller of [`crate::ApiClient::request`].
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// Sent as-is.
    Bytes(Vec<u8>),
    /// Sent as UTF-8.
    Text(String),
    /// Serialized to JSON text; defaults `Content-Type: application/json`.
    Json(serde_json::Value),
}

/// Per-call options: method, extra headers and body.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    /// Empty `GET` options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header. Request-level headers win over client defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a JSON body; see [`RequestBody::Json`].
    pub fn json(self, value: serde_json::Value) -> Self {
        self.body(RequestBody::Json(value))
    }
}

/// The request as seen by interceptors and the transport.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// Declared `Content-Type`, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Decoded response payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Response metadata handed to response interceptors.
#[derive(Clone, Debug)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: HeaderMap,
    pub url: String,
    /// 1-indexed attempt that produced this response.
    pub attempt: u32,
}

/// Final response of a logical request.
///
/// `ok` is `true` for 2xx and 3xx statuses. Non-retryable error statuses such
/// as 404 arrive here with `ok == false` rather than as an error.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    pub headers: HeaderMap,
    pub data: ResponseBody,
}

impl ApiResponse {
    /// Deserializes a JSON payload into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            ResponseBody::Json(value) => {
                serde_json::from_value(value.clone()).map_err(|err| {
                    ApiClientError::MalformedResponse {
                        status: self.status,
                        message: format!("unexpected JSON shape: {err}"),
                    }
                })
            }
            ResponseBody::Text(_) => Err(ApiClientError::MalformedResponse {
                status: self.status,
                message: "response body is not JSON".to_owned(),
            }),
        }
    }
}

pub(crate) fn is_ok_status(status: u16) -> bool {
    (200..400).contains(&status)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderMap;
    use serde::Deserialize;
    use serde_json::json;

    use super::is_ok_status;
    use crate::{ApiClientError, ApiResponse, ResponseBody};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Agent {
        name: String,
    }

    #[test]
    fn ok_covers_success_and_redirect_ranges() {
        assert!(is_ok_status(200));
        assert!(is_ok_status(304));
        assert!(!is_ok_status(404));
        assert!(!is_ok_status(199));
        assert!(!is_ok_status(500));
    }

    #[test]
    fn typed_json_helper() {
        let response = ApiResponse {
            ok: true,
            status: 200,
            headers: HeaderMap::new(),
            data: ResponseBody::Json(json!({"name": "worker"})),
        };
        let agent: Agent = response.json().expect("must deserialize");
        assert_eq!(agent.name, "worker");
    }

    #[test]
    fn typed_json_helper_rejects_text() {
        let response = ApiResponse {
            ok: true,
            status: 200,
            headers: HeaderMap::new(),
            data: ResponseBody::Text("hello".to_owned()),
        };
        let err = response.json::<Agent>().expect_err("must fail");
        assert!(matches!(err, ApiClientError::MalformedResponse { .. }));
    }
}
