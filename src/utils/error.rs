use thiserror::Error;

/// Error from compiling display filter text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Unparseable filter text; `position` is a byte offset into the input
    #[error("Filter syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
}

impl FilterError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        FilterError::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Error from fetching a page of records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The listing endpoint answered with an error or an unreadable body
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The response belongs to a capture that has since been reset
    #[error("Stale page discarded")]
    Stale,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::ServerError {
                status: e.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("Malformed response body: {}", e),
            }
        } else if let Some(status) = e.status() {
            FetchError::ServerError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON serialization/deserialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No capture with this id is loaded
    #[error("Capture {0} not found")]
    CaptureNotFound(String),

    /// A capture file or id that cannot be used
    #[error("Invalid capture: {0}")]
    InvalidCapture(String),
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
