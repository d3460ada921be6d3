use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{EmbeddedChunk, KnowledgeError};

/// Ordered collection of embedded chunks. Serializes as a bare JSON array.
///
/// Every vector in a knowledge base has the same length; [`push`](Self::push)
/// and [`TryFrom`] enforce that, so a value of this type is always consistent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EmbeddedChunk>", into = "Vec<EmbeddedChunk>")]
pub struct KnowledgeBase {
    chunks: Vec<EmbeddedChunk>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chunks: Vec::with_capacity(capacity),
        }
    }

    /// Append a chunk, rejecting it when its vector length differs from the first chunk's.
    pub fn push(&mut self, chunk: EmbeddedChunk) -> Result<(), KnowledgeError> {
        if let Some(expected) = self.dimension() {
            if chunk.dimension() != expected {
                return Err(KnowledgeError::DimensionMismatch {
                    index: self.chunks.len(),
                    expected,
                    actual: chunk.dimension(),
                });
            }
        }
        self.chunks.push(chunk);
        Ok(())
    }

    /// Shared vector length, or `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(EmbeddedChunk::dimension)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[EmbeddedChunk] {
        &self.chunks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmbeddedChunk> {
        self.chunks.iter()
    }

    pub fn into_chunks(self) -> Vec<EmbeddedChunk> {
        self.chunks
    }
}

impl TryFrom<Vec<EmbeddedChunk>> for KnowledgeBase {
    type Error = KnowledgeError;

    fn try_from(chunks: Vec<EmbeddedChunk>) -> Result<Self, Self::Error> {
        let mut kb = KnowledgeBase::with_capacity(chunks.len());
        for chunk in chunks {
            kb.push(chunk)?;
        }
        Ok(kb)
    }
}

impl From<KnowledgeBase> for Vec<EmbeddedChunk> {
    fn from(kb: KnowledgeBase) -> Self {
        kb.chunks
    }
}

impl<'a> IntoIterator for &'a KnowledgeBase {
    type Item = &'a EmbeddedChunk;
    type IntoIter = std::slice::Iter<'a, EmbeddedChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Serialize `kb` to `path`, creating the parent directory and overwriting any prior file.
///
/// The write goes straight to the destination; a crash midway leaves a truncated file.
pub fn write_knowledge_base(
    path: impl AsRef<Path>,
    kb: &KnowledgeBase,
) -> Result<(), KnowledgeError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| KnowledgeError::io(parent, e))?;
        }
    }

    let file = File::create(path).map_err(|e| KnowledgeError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &kb.chunks)?;
    writer.flush().map_err(|e| KnowledgeError::io(path, e))?;

    info!(
        path = %path.display(),
        chunks = kb.len(),
        dimension = ?kb.dimension(),
        "knowledge_base_written"
    );
    Ok(())
}

/// Load a knowledge base previously written by [`write_knowledge_base`].
pub fn read_knowledge_base(path: impl AsRef<Path>) -> Result<KnowledgeBase, KnowledgeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| KnowledgeError::io(path, e))?;
    let chunks: Vec<EmbeddedChunk> = serde_json::from_reader(BufReader::new(file))?;
    KnowledgeBase::try_from(chunks)
}
