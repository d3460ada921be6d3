use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while building or persisting a knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// A chunk's vector length disagrees with the vectors already stored.
    #[error("embedding dimension mismatch at chunk {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    /// Filesystem failure while reading or writing `path`.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file exists but is not a JSON array of embedded chunks.
    #[error("malformed knowledge base: {0}")]
    Json(#[from] serde_json::Error),
}

impl KnowledgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        KnowledgeError::Io {
            path: path.into(),
            source,
        }
    }
}
