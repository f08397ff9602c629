//! Error types for the bearing monitor

/// Errors that can occur in the bearing monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// True for failures where the request never produced a response
    pub fn is_network(&self) -> bool {
        matches!(self, MonitorError::Http(_))
    }
}

/// Result type alias for bearing monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
