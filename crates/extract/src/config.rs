use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Paragraph filter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractConfig {
    /// A paragraph survives only if its trimmed length (in characters) is strictly greater
    /// than this. Drops headers, footers, and page numbers along with the odd short paragraph.
    pub min_paragraph_chars: usize,
    /// Boundary between candidate paragraphs in a page's raw text.
    pub paragraph_separator: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 50,
            paragraph_separator: "\n\n".into(),
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paragraph_separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        Ok(())
    }
}
