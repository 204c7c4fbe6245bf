//! Error types for GECToR serving

use std::error::Error as StdError;
use std::fmt::Write;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for GECToR operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request body has no `input_text` key
    #[error("No \"input_text\" Parameter")]
    MissingInputText,

    /// Request body is well-formed JSON but cannot be used
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Model loading or inference errors
    #[error("model error: {0}")]
    Model(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Render this error and every underlying cause, one per line.
    ///
    /// The output is what NG responses carry in `error.traceback`.
    pub fn traceback(&self) -> String {
        let mut out = format!("Error: {}", self);
        let mut source = self.source();
        let mut depth = 0;
        while let Some(cause) = source {
            if depth == 0 {
                out.push_str("\n\nCaused by:");
            }
            let _ = write!(out, "\n    {}: {}", depth, cause);
            depth += 1;
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_text_message() {
        assert_eq!(
            Error::MissingInputText.to_string(),
            "No \"input_text\" Parameter"
        );
    }

    #[test]
    fn test_traceback_includes_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "params.json missing");
        let err = Error::from(io);

        let tb = err.traceback();
        assert!(tb.starts_with("Error: io error: params.json missing"));
        assert!(tb.contains("Caused by:"));
        assert!(tb.contains("0: params.json missing"));
    }

    #[test]
    fn test_traceback_without_source() {
        let tb = Error::model("tagger failed").traceback();
        assert_eq!(tb, "Error: model error: tagger failed");
    }
}
