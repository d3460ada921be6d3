//! Shared ONNX Runtime plumbing.
//!
//! The chat crate drives its question-answering and generation models through
//! the same helpers, so everything here is model-agnostic: feed token ids and a
//! mask, get every output back as an owned `f32` tensor.

use std::path::Path;

use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, ArrayD, IxDyn};
use onnxruntime::session::Session;

use crate::EmbedError;

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

/// Process-wide runtime environment. Sessions borrow it for `'static`.
pub fn ort_environment() -> Result<&'static Environment, EmbedError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("pdfchat")
            .build()
            .map_err(EmbedError::inference)
    })
}

/// Open an inference session for the `.onnx` file at `path`.
pub fn load_session(path: &Path) -> Result<Session<'static>, EmbedError> {
    if !path.exists() {
        return Err(EmbedError::ModelNotFound(path.display().to_string()));
    }
    let env = ort_environment()?;
    env.new_session_builder()
        .map_err(EmbedError::inference)?
        .with_model_from_file(path.to_path_buf())
        .map_err(EmbedError::inference)
}

/// One model output copied out of the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl OutputTensor {
    /// Row `row` of a `[1, rows, cols]` or `[rows, cols]` tensor.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        let cols = *self.shape.last()?;
        let start = row.checked_mul(cols)?;
        self.data.get(start..start + cols)
    }
}

/// Build a batch-of-one input list in the order the session declares it.
///
/// `token_type_ids` is all zeros and `position_ids` counts up from zero; any
/// other input name is rejected.
pub fn session_inputs(
    session: &Session<'_>,
    ids: &[i64],
    mask: &[i64],
) -> Result<Vec<ArrayD<i64>>, EmbedError> {
    if ids.len() != mask.len() {
        return Err(EmbedError::Inference(
            "tokenizer produced mismatched id/mask lengths".into(),
        ));
    }
    let shape = IxDyn(&[1, ids.len()]);
    let mut inputs = Vec::with_capacity(session.inputs.len());

    for input in &session.inputs {
        let values: Vec<i64> = match input.name.as_str() {
            "input_ids" => ids.to_vec(),
            "attention_mask" => mask.to_vec(),
            "token_type_ids" => vec![0; ids.len()],
            "position_ids" => (0..ids.len() as i64).collect(),
            other => {
                return Err(EmbedError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        };
        let tensor =
            Array::from_shape_vec(shape.clone(), values).map_err(EmbedError::inference)?;
        inputs.push(tensor);
    }

    if inputs.is_empty() {
        return Err(EmbedError::Inference(
            "model did not declare any inputs".into(),
        ));
    }
    Ok(inputs)
}

/// Run the session and copy every output into an [`OutputTensor`].
pub fn run_f32(
    session: &mut Session<'static>,
    inputs: Vec<ArrayD<i64>>,
) -> Result<Vec<OutputTensor>, EmbedError> {
    let outputs = session
        .run::<i64, f32, _>(inputs)
        .map_err(EmbedError::inference)?;

    let copied: Vec<OutputTensor> = outputs
        .iter()
        .map(|t| OutputTensor {
            shape: t.shape().to_vec(),
            data: t.iter().copied().collect(),
        })
        .collect();

    if copied.is_empty() {
        return Err(EmbedError::Inference("model returned no outputs".into()));
    }
    Ok(copied)
}
