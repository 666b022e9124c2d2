use thiserror::Error;

/// Errors raised by [`ProcessorClient`](super::ProcessorClient).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a response (connection refused, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Server answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server returned an empty download")]
    EmptyDownload,
    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
