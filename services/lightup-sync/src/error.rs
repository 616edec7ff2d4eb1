//! Error types for the LightUp sync service

/// Errors that can occur while talking to the LightUpPi backend or running the service
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The backend answered, but the body carried an `error` field
    #[error("Backend error: {0}")]
    Application(String),

    /// Connection failure, non-2xx status, or a body that could not be decoded
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// True for errors reported by the backend itself rather than by the network
    pub fn is_application(&self) -> bool {
        matches!(self, SyncError::Application(_))
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
