use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::EmbedError;

const HF_MINILM: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Which model to load and how to feed it.
///
/// # Example
/// ```no_run
/// use embed::{load_embedder, EmbedConfig, Embedder};
///
/// let cfg = EmbedConfig {
///     mode: "fast".into(),
///     stub_dimension: 8,
///     ..Default::default()
/// };
/// let embedder = load_embedder(&cfg).unwrap();
/// assert_eq!(embedder.embed("hello").unwrap().len(), 8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedConfig {
    /// `"onnx"` runs the real model; `"fast"` uses the deterministic stub (tests, dry runs).
    pub mode: String,
    /// Label for logs.
    pub model_name: String,
    /// Local ONNX export of the sentence encoder. Also the download target for `model_url`.
    pub model_path: PathBuf,
    /// Fetched into `model_path` when the file is missing.
    pub model_url: Option<String>,
    /// Local `tokenizer.json`.
    pub tokenizer_path: PathBuf,
    /// Fetched into `tokenizer_path` when the file is missing.
    pub tokenizer_url: Option<String>,
    /// Token budget per chunk; longer content is truncated.
    pub max_sequence_length: usize,
    /// Vector length produced in `"fast"` mode.
    pub stub_dimension: usize,
    /// Overall timeout for each asset download.
    pub download_timeout_secs: u64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            model_name: "sentence-transformers/all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx"),
            model_url: Some(format!("{HF_MINILM}/onnx/model.onnx")),
            tokenizer_path: PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json"),
            tokenizer_url: Some(format!("{HF_MINILM}/tokenizer.json")),
            max_sequence_length: 512,
            stub_dimension: 384,
            download_timeout_secs: 300,
        }
    }
}

impl EmbedConfig {
    pub fn validate(&self) -> Result<(), EmbedError> {
        match self.mode.as_str() {
            "onnx" | "fast" => {}
            other => {
                return Err(EmbedError::InvalidConfig(format!(
                    "mode must be \"onnx\" or \"fast\", got {other:?}"
                )))
            }
        }
        if self.max_sequence_length == 0 {
            return Err(EmbedError::InvalidConfig(
                "max_sequence_length must be >= 1".into(),
            ));
        }
        if self.mode == "fast" && self.stub_dimension == 0 {
            return Err(EmbedError::InvalidConfig(
                "stub_dimension must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
