use std::time::Duration;

use crate::{ResponseBody, TransportError};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// Every attempt answered with a retryable status.
    #[error("request failed with status {status} after {attempts} attempts")]
    RetriesExhausted {
        /// Status code of the last attempt.
        status: u16,
        /// Number of physical attempts performed.
        attempts: u32,
        /// Decoded body of the last attempt.
        body: ResponseBody,
    },
    /// A physical attempt did not complete within the configured timeout.
    #[error("request timeout after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },
    /// Response declared JSON but the body could not be decoded.
    #[error("malformed response with status {status}: {message}")]
    MalformedResponse { status: u16, message: String },
    /// The request never produced an HTTP response (DNS, connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
    /// Client options or retry policy are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A header name or value could not be converted.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// Request body could not be serialized to JSON.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    /// A request interceptor refused the request.
    #[error("interceptor error: {0}")]
    Interceptor(String),
}

/// Coarse classification of [`ApiClientError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RetriesExhausted,
    Timeout,
    MalformedResponse,
    Transport,
    InvalidConfig,
    InvalidHeader,
    Encode,
    Interceptor,
}

impl ApiClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::InvalidHeader(_) => ErrorKind::InvalidHeader,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Interceptor(_) => ErrorKind::Interceptor,
        }
    }

    /// HTTP status of the response that caused the error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RetriesExhausted { status, .. } | Self::MalformedResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether the failure was classified retryable.
    ///
    /// Only [`ApiClientError::RetriesExhausted`] is; it reaches the caller
    /// once the attempt budget is spent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
