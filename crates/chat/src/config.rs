use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ChatError;

const HF_QA: &str =
    "https://huggingface.co/distilbert/distilbert-base-cased-distilled-squad/resolve/main";
const HF_GPT2: &str = "https://huggingface.co/openai-community/gpt2/resolve/main";

/// Where a model lives on disk and where to fetch it from when it doesn't.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelAssetsConfig {
    pub model_path: PathBuf,
    pub model_url: Option<String>,
    pub tokenizer_path: PathBuf,
    pub tokenizer_url: Option<String>,
}

impl ModelAssetsConfig {
    /// `onnx_file` is relative to the repo root, e.g. `onnx/model.onnx`.
    fn hugging_face(local_dir: &str, base_url: &str, onnx_file: &str) -> Self {
        Self {
            model_path: PathBuf::from(format!("{local_dir}/{onnx_file}")),
            model_url: Some(format!("{base_url}/{onnx_file}")),
            tokenizer_path: PathBuf::from(format!("{local_dir}/tokenizer.json")),
            tokenizer_url: Some(format!("{base_url}/tokenizer.json")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// First (and, after a clear, only) message of every session.
    pub greeting: String,
    pub health_tip: String,
    /// Case-insensitive substring that triggers the health tip.
    pub health_tip_keyword: String,

    pub qa: ModelAssetsConfig,
    /// Tokens per question+context window.
    pub qa_max_seq_len: usize,
    /// Overlap between consecutive context windows.
    pub doc_stride: usize,
    /// Longest answer span, in tokens.
    pub max_answer_len: usize,

    pub generator: ModelAssetsConfig,
    /// Total sequence length including the prompt.
    pub max_length: usize,
    pub no_repeat_ngram_size: usize,
    pub eos_token: String,

    pub download_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "How may I assist you today?".into(),
            health_tip:
                "A healthy diet and regular exercise are important for maintaining good health."
                    .into(),
            health_tip_keyword: "health tip".into(),
            qa: ModelAssetsConfig::hugging_face(
                "./models/distilbert-base-cased-distilled-squad",
                HF_QA,
                "onnx/model.onnx",
            ),
            qa_max_seq_len: 384,
            doc_stride: 128,
            max_answer_len: 15,
            // Plain decoder without the past-key-value inputs; the merged
            // export also wants `past_key_values.*` and `use_cache_branch`.
            generator: ModelAssetsConfig::hugging_face(
                "./models/gpt2",
                HF_GPT2,
                "onnx/decoder_model.onnx",
            ),
            max_length: 512,
            no_repeat_ngram_size: 2,
            eos_token: "<|endoftext|>".into(),
            download_timeout_secs: 300,
        }
    }
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.health_tip_keyword.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "health_tip_keyword must not be empty".into(),
            ));
        }
        if self.doc_stride >= self.qa_max_seq_len {
            return Err(ChatError::InvalidConfig(format!(
                "doc_stride ({}) must be smaller than qa_max_seq_len ({})",
                self.doc_stride, self.qa_max_seq_len
            )));
        }
        if self.max_answer_len == 0 {
            return Err(ChatError::InvalidConfig(
                "max_answer_len must be >= 1".into(),
            ));
        }
        if self.max_length == 0 {
            return Err(ChatError::InvalidConfig("max_length must be >= 1".into()));
        }
        Ok(())
    }
}
