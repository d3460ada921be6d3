use fxhash::hash64;

use crate::{EmbedError, Embedder};

/// Deterministic stand-in for the real encoder, selected with mode `"fast"`.
///
/// Values are sinusoids of a hash of the text, so equal inputs always give equal
/// vectors and no model files are needed.
#[derive(Debug, Clone, Copy)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let h = hash64(text.as_bytes());
        let v = (0..self.dimension)
            .map(|idx| ((h >> (idx % 32)) as f32 * 0.0001).sin())
            .collect();
        Ok(v)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_is_deterministic() {
        let stub = StubEmbedder::new(16);
        assert_eq!(stub.embed("same").unwrap(), stub.embed("same").unwrap());
    }

    #[test]
    fn stub_respects_dimension() {
        let stub = StubEmbedder::new(384);
        let v = stub.embed("hello world").unwrap();
        assert_eq!(v.len(), 384);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn different_text_gives_different_vectors() {
        let stub = StubEmbedder::new(32);
        assert_ne!(stub.embed("alpha").unwrap(), stub.embed("beta").unwrap());
    }
}
