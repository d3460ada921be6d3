use thiserror::Error;

use embed::EmbedError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid chat config: {0}")]
    InvalidConfig(String),
    /// Asset resolution or ONNX session failure, shared with the embed crate.
    #[error(transparent)]
    Runtime(#[from] EmbedError),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("inference failure: {0}")]
    Inference(String),
    /// The model ran but produced nothing usable.
    #[error("no answer found")]
    NoAnswer,
}

impl ChatError {
    pub(crate) fn tokenizer(err: impl ToString) -> Self {
        ChatError::Tokenizer(err.to_string())
    }
}
