//! Error types for the endpoint.

/// Listener-level errors surfaced to the caller.
///
/// Connection and frame errors never show up here; they are logged and
/// only end the affected connection or frame.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("listener did not shut down cleanly: {0}")]
    Shutdown(String),
}
