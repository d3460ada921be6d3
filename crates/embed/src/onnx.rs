use std::cell::RefCell;

use onnxruntime::session::Session;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::assets::resolve_model_assets;
use crate::pool::mean_pool;
use crate::runtime::{load_session, run_f32, session_inputs, OutputTensor};
use crate::{EmbedConfig, EmbedError, Embedder};

/// Sentence encoder backed by an ONNX export of a BERT-style model.
///
/// The output vector is the mean of the last hidden state over all tokens.
pub struct OnnxEmbedder {
    tokenizer: Tokenizer,
    session: RefCell<Session<'static>>,
    model_name: String,
    dimension: Option<usize>,
}

impl OnnxEmbedder {
    pub fn load(cfg: &EmbedConfig) -> Result<Self, EmbedError> {
        let assets = resolve_model_assets(cfg)?;

        let mut tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| EmbedError::TokenizerMissing(e.to_string()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: cfg.max_sequence_length,
                ..Default::default()
            }))
            .map_err(EmbedError::inference)?;
        tokenizer.with_padding(None);

        let session = load_session(&assets.model_path)?;
        let dimension = session
            .outputs
            .first()
            .and_then(|out| out.dimensions.last().copied().flatten())
            .map(|d| d as usize);

        info!(
            model = %cfg.model_name,
            path = %assets.model_path.display(),
            dimension = ?dimension,
            "embedder_loaded"
        );

        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
            model_name: cfg.model_name.clone(),
            dimension,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(EmbedError::inference)?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();

        let mut guard = self.session.borrow_mut();
        let inputs = session_inputs(&guard, &ids, &mask)?;
        let outputs = run_f32(&mut guard, inputs)?;
        let hidden = outputs
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("model returned no outputs".into()))?;

        sentence_vector(hidden, &mask)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

/// Reduce the encoder's first output to one vector for a batch of one.
fn sentence_vector(output: OutputTensor, mask: &[i64]) -> Result<Vec<f32>, EmbedError> {
    match output.shape.as_slice() {
        // [batch, seq, hidden]: token embeddings, pool them.
        [1, seq_len, dim] => mean_pool(&output.data, *seq_len, *dim, mask),
        // [batch, hidden]: the export already pooled.
        [1, _dim] => Ok(output.data),
        other => Err(EmbedError::Inference(format!(
            "unexpected output shape {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(shape: &[usize], data: &[f32]) -> OutputTensor {
        OutputTensor {
            shape: shape.to_vec(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn token_embeddings_are_mean_pooled() {
        let out = tensor(&[1, 2, 3], &[1.0, 2.0, 3.0, 3.0, 4.0, 5.0]);
        let v = sentence_vector(out, &[1, 1]).unwrap();
        assert_eq!(v, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn pooled_output_passes_through() {
        let out = tensor(&[1, 4], &[0.5, -0.5, 0.25, 0.0]);
        let v = sentence_vector(out, &[1, 1, 1]).unwrap();
        assert_eq!(v, vec![0.5, -0.5, 0.25, 0.0]);
    }

    #[test]
    fn other_shapes_are_rejected() {
        for shape in [vec![2, 2], vec![4], vec![1, 1, 2, 2], vec![2, 1, 2]] {
            let len = shape.iter().product::<usize>();
            let out = tensor(&shape, &vec![0.0; len]);
            let err = sentence_vector(out, &[1]).unwrap_err();
            assert!(matches!(err, EmbedError::Inference(msg) if msg.contains("unexpected output shape")));
        }
    }

    #[test]
    #[ignore = "requires all-MiniLM-L6-v2 ONNX assets"]
    fn minilm_produces_384_dimensions() {
        let embedder = OnnxEmbedder::load(&EmbedConfig::default()).unwrap();
        assert_eq!(embedder.dimension(), Some(384));
        let v = embedder
            .embed("Memory is the faculty by which the brain encodes information.")
            .unwrap();
        assert_eq!(v.len(), 384);
        assert!(v.iter().all(|x| x.is_finite()));
    }
}
