//! Debug-level log sink used for retry decisions.

/// Receives one debug entry per retry decision.
pub trait LogSink: Send + Sync {
    fn debug(&self, message: &str, data: Option<&serde_json::Value>);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn debug(&self, _message: &str, _data: Option<&serde_json::Value>) {}
}

/// Forwards entries to `tracing::debug!`.
///
/// Enabled with the `tracing` feature.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl LogSink for TracingSink {
    fn debug(&self, message: &str, data: Option<&serde_json::Value>) {
        match data {
            Some(data) => tracing::debug!(target: "resilient_api_client", %data, "{message}"),
            None => tracing::debug!(target: "resilient_api_client", "{message}"),
        }
    }
}

#[cfg(feature = "tracing")]
pub(crate) fn default_sink() -> std::sync::Arc<dyn LogSink> {
    std::sync::Arc::new(TracingSink)
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn default_sink() -> std::sync::Arc<dyn LogSink> {
    std::sync::Arc::new(NoopSink)
}
