//! pdfchat embedding layer
//!
//! Turns [`DocumentChunk`]s into [`EmbeddedChunk`]s with a sentence encoder
//! (all-MiniLM-L6-v2 by default, run through ONNX Runtime).
//!
//! ## Modes
//!
//! - `"onnx"` loads the tokenizer and model from disk, downloading them first
//!   when a URL is configured and the file is missing. Load failures are
//!   returned to the caller; there is no silent fallback.
//! - `"fast"` uses [`StubEmbedder`], a hash-based deterministic vector of
//!   `stub_dimension` values. Handy for tests and dry runs.
//!
//! Each chunk is embedded independently, in input order. One failure aborts
//! the whole batch: a knowledge base with holes is worse than none.
//!
//! [`runtime`] exposes the session helpers so other crates can drive their own
//! ONNX models the same way.

use tracing::{error, info};

mod assets;
mod config;
mod error;
mod onnx;
mod pool;
pub mod runtime;
mod stub;

pub use crate::assets::ensure_local_file;
pub use crate::config::EmbedConfig;
pub use crate::error::EmbedError;
pub use crate::onnx::OnnxEmbedder;
pub use crate::pool::mean_pool;
pub use crate::stub::StubEmbedder;
pub use knowledge::{DocumentChunk, EmbeddedChunk, KnowledgeBase};

/// Maps text to a fixed-length vector.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Vector length the model declares, when it declares one.
    fn dimension(&self) -> Option<usize>;
}

impl<T: Embedder + ?Sized> Embedder for &T {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(text)
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(text)
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }
}

/// Build the embedder selected by `cfg.mode`.
pub fn load_embedder(cfg: &EmbedConfig) -> Result<Box<dyn Embedder>, EmbedError> {
    cfg.validate()?;
    match cfg.mode.as_str() {
        "fast" => Ok(Box::new(StubEmbedder::new(cfg.stub_dimension))),
        _ => Ok(Box::new(OnnxEmbedder::load(cfg)?)),
    }
}

/// Embed every chunk, in order, into a new [`KnowledgeBase`].
///
/// `on_progress` is called after each chunk with the number done so far.
/// The first failure aborts the run; nothing partial is returned.
pub fn embed_chunks<E, F>(
    chunks: Vec<DocumentChunk>,
    embedder: &E,
    mut on_progress: F,
) -> Result<KnowledgeBase, EmbedError>
where
    E: Embedder + ?Sized,
    F: FnMut(usize, &DocumentChunk),
{
    let declared = embedder.dimension();
    let mut kb = KnowledgeBase::with_capacity(chunks.len());

    for (index, chunk) in chunks.into_iter().enumerate() {
        let vector = embedder.embed(&chunk.content).map_err(|err| {
            error!(
                source = %chunk.source,
                page = chunk.page,
                error = %err,
                "embed_chunk_failure"
            );
            err
        })?;

        if let Some(expected) = declared {
            if vector.len() != expected {
                return Err(EmbedError::DimensionMismatch {
                    index,
                    expected,
                    actual: vector.len(),
                });
            }
        }

        on_progress(index + 1, &chunk);
        kb.push(chunk.with_embedding(vector))?;
    }

    info!(
        chunks = kb.len(),
        dimension = ?kb.dimension(),
        "embed_complete"
    );
    Ok(kb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn chunk(text: &str, page: u32) -> DocumentChunk {
        DocumentChunk::new(text, "doc.pdf", page)
    }

    struct FailingOn {
        bad: &'static str,
        calls: Cell<usize>,
    }

    impl Embedder for FailingOn {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            self.calls.set(self.calls.get() + 1);
            if text == self.bad {
                Err(EmbedError::Inference("boom".into()))
            } else {
                Ok(vec![0.5; 4])
            }
        }

        fn dimension(&self) -> Option<usize> {
            Some(4)
        }
    }

    /// Claims one size, returns another.
    struct Liar;

    impl Embedder for Liar {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Ok(vec![1.0; 3])
        }

        fn dimension(&self) -> Option<usize> {
            Some(4)
        }
    }

    #[test]
    fn every_chunk_gets_a_vector_of_the_same_length() {
        let stub = StubEmbedder::new(384);
        let chunks = vec![chunk("first paragraph", 1), chunk("second one", 2)];
        let kb = embed_chunks(chunks, &stub, |_, _| {}).unwrap();

        assert_eq!(kb.len(), 2);
        assert_eq!(kb.dimension(), Some(384));
        assert!(kb.iter().all(|c| c.embedding.len() == 384));
        assert_eq!(kb.chunks()[1].content, "second one");
        assert_eq!(kb.chunks()[1].page, 2);
    }

    #[test]
    fn empty_input_gives_empty_knowledge_base() {
        let kb = embed_chunks(Vec::new(), &StubEmbedder::new(8), |_, _| {}).unwrap();
        assert!(kb.is_empty());
    }

    #[test]
    fn first_failure_aborts_the_batch() {
        let embedder = FailingOn {
            bad: "two",
            calls: Cell::new(0),
        };
        let chunks = vec![chunk("one", 1), chunk("two", 1), chunk("three", 1)];
        let err = embed_chunks(chunks, &embedder, |_, _| {}).unwrap_err();

        assert!(matches!(err, EmbedError::Inference(_)));
        assert_eq!(embedder.calls.get(), 2);
    }

    #[test]
    fn vector_length_must_match_declared_dimension() {
        let err = embed_chunks(vec![chunk("x", 1)], &Liar, |_, _| {}).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch {
                index: 0,
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn progress_counts_up() {
        let mut seen = Vec::new();
        let chunks = vec![chunk("a", 1), chunk("b", 1), chunk("c", 2)];
        embed_chunks(chunks, &StubEmbedder::new(4), |done, c| {
            seen.push((done, c.content.clone()))
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![(1, "a".to_string()), (2, "b".to_string()), (3, "c".to_string())]
        );
    }

    #[test]
    fn fast_mode_loads_without_model_files() {
        let cfg = EmbedConfig {
            mode: "fast".into(),
            stub_dimension: 12,
            ..Default::default()
        };
        let embedder = load_embedder(&cfg).unwrap();
        assert_eq!(embedder.dimension(), Some(12));
        assert_eq!(embedder.embed("hi").unwrap().len(), 12);
    }

    #[test]
    fn onnx_mode_without_assets_fails_to_load() {
        let cfg = EmbedConfig {
            model_path: "./missing/model.onnx".into(),
            model_url: None,
            ..Default::default()
        };
        assert!(matches!(
            load_embedder(&cfg),
            Err(EmbedError::ModelNotFound(_))
        ));
    }
}
