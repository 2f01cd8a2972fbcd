//! AI client error types.

use thiserror::Error;

/// Result type for AI service calls.
pub type AiResult<T> = Result<T, AiError>;

/// Errors from the transcription and analysis clients.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Service not configured: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
