use std::io;
use thiserror::Error;

/// Why a single document could not be turned into page text.
///
/// These are per-file failures: the extractor records them and moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The path does not exist.
    #[error("PDF file not found: {0}")]
    NotFound(String),
    /// Any other filesystem failure while reading the file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The PDF parser rejected the file (or panicked on it).
    #[error("failed to parse PDF: {0}")]
    Parse(String),
}

/// Errors raised by [`ExtractConfig::validate`](crate::ExtractConfig::validate).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("paragraph separator must not be empty")]
    EmptySeparator,
}

impl Clone for ExtractError {
    fn clone(&self) -> Self {
        match self {
            ExtractError::NotFound(s) => ExtractError::NotFound(s.clone()),
            ExtractError::Io(e) => ExtractError::Io(io::Error::new(e.kind(), e.to_string())),
            ExtractError::Parse(s) => ExtractError::Parse(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_path() {
        let err = ExtractError::NotFound("data/missing.pdf".into());
        assert_eq!(err.to_string(), "PDF file not found: data/missing.pdf");
    }

    #[test]
    fn clone_keeps_io_kind() {
        let err = ExtractError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        match err.clone() {
            ExtractError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected clone: {other:?}"),
        }
    }

    #[test]
    fn parse_error_message() {
        let err = ExtractError::Parse("invalid xref".into());
        assert!(err.to_string().contains("invalid xref"));
    }
}
