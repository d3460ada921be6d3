//! YAML configuration for the preprocess pipeline
//!
//! Every field is optional; a missing file means "use the defaults", which
//! reproduce the stock setup (two PDFs under `data/`, MiniLM embeddings,
//! output in `processed_data/knowledge_base.json`).
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! documents:
//!   paths:
//!     - data/ebooks_academic_geop4e_frontmatter.pdf
//!     - data/Gale-Encyclopedia-of-Psychology-2nd-ed.-2001.pdf
//!   min_paragraph_chars: 50
//!
//! embedding:
//!   mode: "onnx"
//!   model_path: "./models/all-MiniLM-L6-v2/onnx/model.onnx"
//!   tokenizer_path: "./models/all-MiniLM-L6-v2/tokenizer.json"
//!   max_sequence_length: 512
//!
//! output:
//!   knowledge_base_path: "processed_data/knowledge_base.json"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use embed::EmbedConfig;
use extract::ExtractConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default file name looked up by the `preprocess` binary.
pub const DEFAULT_CONFIG_FILE: &str = "pdfchat.yaml";

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PdfchatConfig {
    /// Configuration format version
    #[serde(default = "default_config_version")]
    pub version: String,

    #[serde(default)]
    pub documents: DocumentsYamlConfig,

    #[serde(default)]
    pub embedding: EmbedConfig,

    #[serde(default)]
    pub output: OutputYamlConfig,
}

impl PdfchatConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PdfchatConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.documents.validate()?;
        self.embedding
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.output.validate()?;
        Ok(())
    }

    /// Paragraph-splitting settings for the extract stage.
    pub fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            min_paragraph_chars: self.documents.min_paragraph_chars,
            ..ExtractConfig::default()
        }
    }
}

impl Default for PdfchatConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            documents: DocumentsYamlConfig::default(),
            embedding: EmbedConfig::default(),
            output: OutputYamlConfig::default(),
        }
    }
}

/// Which PDFs to read and how to split them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsYamlConfig {
    #[serde(default = "extract::default_document_paths")]
    pub paths: Vec<PathBuf>,

    /// Paragraphs must be strictly longer than this (trimmed, in characters).
    #[serde(default = "default_min_paragraph_chars")]
    pub min_paragraph_chars: usize,
}

impl DocumentsYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if let Some(empty) = self.paths.iter().find(|p| p.as_os_str().is_empty()) {
            return Err(ConfigLoadError::Validation(format!(
                "documents.paths contains an empty path: {empty:?}"
            )));
        }
        Ok(())
    }
}

impl Default for DocumentsYamlConfig {
    fn default() -> Self {
        Self {
            paths: extract::default_document_paths(),
            min_paragraph_chars: default_min_paragraph_chars(),
        }
    }
}

/// Where the knowledge base goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputYamlConfig {
    #[serde(default = "default_knowledge_base_path")]
    pub knowledge_base_path: PathBuf,
}

impl OutputYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.knowledge_base_path.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "output.knowledge_base_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for OutputYamlConfig {
    fn default() -> Self {
        Self {
            knowledge_base_path: default_knowledge_base_path(),
        }
    }
}

fn default_config_version() -> String {
    "1.0".to_string()
}

fn default_min_paragraph_chars() -> usize {
    ExtractConfig::default().min_paragraph_chars
}

fn default_knowledge_base_path() -> PathBuf {
    PathBuf::from(knowledge::DEFAULT_KNOWLEDGE_BASE_PATH)
}
