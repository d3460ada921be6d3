use serde::{Deserialize, Serialize};

/// One paragraph of extracted text tagged with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    /// Trimmed paragraph text.
    pub content: String,
    /// Base file name of the source document.
    pub source: String,
    /// 1-based page number inside `source`.
    pub page: u32,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
        }
    }

    /// Attach an embedding vector, consuming the chunk.
    pub fn with_embedding(self, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            content: self.content,
            source: self.source,
            page: self.page,
            embedding,
        }
    }
}

/// A [`DocumentChunk`] plus its vector. Field order matches the on-disk JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    pub content: String,
    pub source: String,
    pub page: u32,
    pub embedding: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Drop the vector and get the provenance-tagged text back.
    pub fn chunk(&self) -> DocumentChunk {
        DocumentChunk {
            content: self.content.clone(),
            source: self.source.clone(),
            page: self.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_embedding_keeps_provenance() {
        let chunk = DocumentChunk::new("some paragraph", "book.pdf", 3);
        let embedded = chunk.clone().with_embedding(vec![0.5, -0.25]);

        assert_eq!(embedded.content, "some paragraph");
        assert_eq!(embedded.source, "book.pdf");
        assert_eq!(embedded.page, 3);
        assert_eq!(embedded.dimension(), 2);
        assert_eq!(embedded.chunk(), chunk);
    }

    #[test]
    fn embedded_chunk_json_keys() {
        let embedded = DocumentChunk::new("text", "a.pdf", 1).with_embedding(vec![1.0]);
        let value = serde_json::to_value(&embedded).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["content", "embedding", "page", "source"]);
        assert!(obj["page"].is_u64());
        assert!(obj["embedding"].is_array());
    }
}
