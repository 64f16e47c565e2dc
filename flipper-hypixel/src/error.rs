//! Error types for Hypixel API requests

use crate::throttle::ThrottleClosed;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("HTTP {status} from {path}")]
    Status { path: String, status: u16 },

    /// Body was not a JSON object (HTML error page, empty body, array, ...)
    #[error("Unexpected body from {path}")]
    NotJson { path: String, body: String },

    #[error("Failed to parse response from {path}: {message}")]
    Parse {
        path: String,
        message: String,
        body: String,
    },

    #[error("Request cancelled: {0}")]
    Closed(#[from] ThrottleClosed),
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        FetchError::Network(msg.into())
    }

    /// Raw response body for failures caused by an unusable payload
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            FetchError::NotJson { body, .. } | FetchError::Parse { body, .. } => Some(body),
            _ => None,
        }
    }
}
