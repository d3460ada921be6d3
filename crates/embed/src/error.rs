use std::io;
use thiserror::Error;

use knowledge::KnowledgeError;

/// Errors surfaced while loading an embedding model or embedding chunks.
///
/// Loading errors are fatal to a run; there is no fallback model.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The ONNX model could not be located locally and no download URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (unknown mode, zero sequence length, ...).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),
    /// Unable to download remote assets.
    #[error("download failed: {0}")]
    Download(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime or tokenizer failure.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The model produced a vector whose length differs from its declared hidden size.
    #[error("embedding for chunk {index} has {actual} values, model declares {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    /// Appending to the knowledge base failed.
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}

impl EmbedError {
    pub(crate) fn inference(err: impl ToString) -> Self {
        EmbedError::Inference(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_model_not_found() {
        let err = EmbedError::ModelNotFound("/path/to/model.onnx".into());
        assert!(err.to_string().contains("model file not found"));
        assert!(err.to_string().contains("/path/to/model.onnx"));
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: EmbedError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn knowledge_errors_pass_through() {
        let err: EmbedError = KnowledgeError::DimensionMismatch {
            index: 2,
            expected: 4,
            actual: 3,
        }
        .into();
        assert!(err.to_string().contains("dimension mismatch at chunk 2"));
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = EmbedError::DimensionMismatch {
            index: 7,
            expected: 384,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("chunk 7"));
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }
}
