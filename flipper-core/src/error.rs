//! Error types for the feed

use thiserror::Error;

/// Feed-wide error type
#[derive(Error, Debug)]
pub enum FlipperError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlipperError {
    pub fn io(msg: impl Into<String>) -> Self {
        FlipperError::Io(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        FlipperError::Config(msg.into())
    }
}

impl From<std::io::Error> for FlipperError {
    fn from(e: std::io::Error) -> Self {
        FlipperError::Io(e.to_string())
    }
}

/// Result type alias for feed operations
pub type FlipperResult<T> = Result<T, FlipperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion_keeps_message() {
        let err: FlipperError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "cache dir locked").into();
        assert!(matches!(err, FlipperError::Io(_)));
        assert_eq!(err.to_string(), "IO error: cache dir locked");
    }
}
