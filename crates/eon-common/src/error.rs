//! Error types for the end-of-night dashboard.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using EonError.
pub type EonResult<T> = Result<T, EonError>;

/// Coarse error classification reported alongside failed asset loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    SourceExhausted,
    HttpStatus,
    Format,
    Transport,
}

/// Primary error type for night resolution, retrieval and decoding.
#[derive(Debug, Clone, Error)]
pub enum EonError {
    // === Validation Errors ===
    #[error("Invalid night: \"{0}\"")]
    InvalidNight(String),

    #[error("Invalid exposure id: \"{0}\"")]
    InvalidExposureId(String),

    // === Retrieval Errors ===
    #[error("None of the {attempts} source(s) were successful for {asset}: {last}")]
    SourceExhausted {
        asset: String,
        attempts: usize,
        last: String,
    },

    #[error("{message}")]
    HttpStatus {
        location: String,
        status: u16,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    // === Decoding Errors ===
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors raised while decoding a retrieved payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Missing %ECSV header")]
    MissingFormatHeader,

    #[error("Header is missing required datatype")]
    MissingDatatype,

    #[error("Malformed header metadata: {0}")]
    MalformedMetadata(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Payload is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Unreadable image: {0}")]
    Image(String),

    #[error("Duplicate key {key} in column {column}")]
    DuplicateKey { column: String, key: String },
}

impl EonError {
    /// Classify this error into the coarse taxonomy used for status reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EonError::InvalidNight(_) | EonError::InvalidExposureId(_) => ErrorKind::Validation,
            EonError::SourceExhausted { .. } => ErrorKind::SourceExhausted,
            EonError::HttpStatus { .. } => ErrorKind::HttpStatus,
            EonError::Transport(_) => ErrorKind::Transport,
            EonError::Format(_) => ErrorKind::Format,
        }
    }

    /// Validation errors abort a whole night selection; everything else is per asset.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<std::io::Error> for EonError {
    fn from(err: std::io::Error) -> Self {
        EonError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for EonError {
    fn from(err: serde_json::Error) -> Self {
        EonError::Format(FormatError::MalformedMetadata(format!("JSON error: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EonError::InvalidNight("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            EonError::InvalidExposureId("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EonError::Format(FormatError::MissingDatatype).kind(),
            ErrorKind::Format
        );
        assert_eq!(EonError::Transport("boom".into()).kind(), ErrorKind::Transport);
        assert!(!EonError::Transport("boom".into()).is_validation());
    }

    #[test]
    fn test_format_messages() {
        assert_eq!(
            EonError::from(FormatError::MissingFormatHeader).to_string(),
            "Missing %ECSV header"
        );
        assert_eq!(
            FormatError::MissingDatatype.to_string(),
            "Header is missing required datatype"
        );
    }

    #[test]
    fn test_http_status_message_passthrough() {
        let err = EonError::HttpStatus {
            location: "https://example.org/a".into(),
            status: 404,
            message: "https://example.org/a: Not Found".into(),
        };
        assert_eq!(err.to_string(), "https://example.org/a: Not Found");
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
    }
}
