//! Error types for the frame message bridge.

use thiserror::Error;

/// Errors raised by a [`ContextChannel`](crate::channel::ContextChannel) when posting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Embedded context is closed")]
    Closed,

    #[error("Embedded context rejected the message: {0}")]
    Rejected(String),
}

/// Bridge-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("No live embedded context is bound to the bridge")]
    NoLiveContext,

    #[error("Request {request_id} timed out after {timeout_ms} ms")]
    Timeout { request_id: String, timeout_ms: u64 },

    #[error("Request {request_id} abandoned: bridge was torn down")]
    TornDown { request_id: String },

    #[error("No tokio runtime available to drive bridge timers")]
    NoRuntime,

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BridgeError {
    /// True for the timer-driven rejection of a request.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }

    /// True for the rejection issued when the owning widget detaches.
    pub fn is_torn_down(&self) -> bool {
        matches!(self, BridgeError::TornDown { .. })
    }
}

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        BridgeError::ConfigError(err.to_string())
    }
}
