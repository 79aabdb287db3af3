use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::{retry::millis, ApiClientError, Result, RetryPolicy};

/// Configures base address, default headers, timeout and retry behavior.
///
/// Deserializes from camelCase JSON with durations in milliseconds, so an
/// application config section can be loaded directly:
///
/// ```
/// use resilient_api_client::ClientOptions;
///
/// let opts = ClientOptions::from_json_str(
///     r#"{"baseUrl":"https://api.example.com","timeout":5000,"retry":{"maxAttempts":5}}"#,
/// )
/// .unwrap();
/// assert_eq!(opts.retry.max_attempts, 5);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// Prefix for relative endpoints. Concatenated literally.
    pub base_url: String,
    /// Headers sent with every request unless overridden per request.
    pub headers: BTreeMap<String, String>,
    /// Per-attempt timeout.
    #[serde(with = "millis")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: BTreeMap::new(),
            timeout: Duration::from_millis(30_000),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientOptions {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Parses options from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| ApiClientError::InvalidConfig(format!("invalid options JSON: {err}")))
    }

    /// Builds options from environment variables.
    ///
    /// Reads (all optional):
    /// - `API_CLIENT_BASE_URL`
    /// - `API_CLIENT_TIMEOUT_MS`
    /// - `API_CLIENT_MAX_ATTEMPTS`
    /// - `API_CLIENT_INITIAL_DELAY_MS`
    /// - `API_CLIENT_MAX_DELAY_MS`
    /// - `API_CLIENT_BACKOFF_MULTIPLIER`
    ///
    /// Unset variables keep their defaults; unparsable values are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();
        if let Some(base_url) = lookup("API_CLIENT_BASE_URL") {
            opts.base_url = base_url.trim().to_owned();
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "API_CLIENT_TIMEOUT_MS")? {
            opts.timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_var(&lookup, "API_CLIENT_MAX_ATTEMPTS")? {
            opts.retry.max_attempts = attempts;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "API_CLIENT_INITIAL_DELAY_MS")? {
            opts.retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "API_CLIENT_MAX_DELAY_MS")? {
            opts.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = parse_var(&lookup, "API_CLIENT_BACKOFF_MULTIPLIER")? {
            opts.retry.backoff_multiplier = multiplier;
        }
        Ok(opts)
    }

    /// Checks timeout and retry policy ranges.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ApiClientError::InvalidConfig(
                "timeout must be greater than zero".to_owned(),
            ));
        }
        self.retry.validate()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|err| {
            ApiClientError::InvalidConfig(format!("{key} has invalid value '{raw}': {err}"))
        }),
    }
}
