use std::cell::RefCell;
use std::iter;
use std::time::Duration;

use embed::ensure_local_file;
use embed::runtime::{load_session, run_f32, session_inputs, OutputTensor};
use onnxruntime::session::Session;
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};
use tracing::debug;

use crate::config::ModelAssetsConfig;
use crate::router::Answerer;
use crate::{ChatConfig, ChatError, ModelHandle};

/// A scored token span inside one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

/// Softmax over positions where `keep` is true; every other position gets 0.
fn masked_softmax(logits: &[f32], keep: &[bool]) -> Vec<f32> {
    let max = logits
        .iter()
        .zip(keep)
        .filter(|(_, &k)| k)
        .map(|(&l, _)| l)
        .fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits
        .iter()
        .zip(keep)
        .map(|(&l, &k)| if k { (l - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// Highest-probability answer span in one window.
///
/// Start and end must both be context tokens, with `start <= end` and the span
/// shorter than `max_answer_len` tokens. The leading `[CLS]` position takes
/// part in normalization but is never part of an answer.
pub fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    is_context: &[bool],
    max_answer_len: usize,
) -> Option<Span> {
    let n = start_logits.len();
    if n == 0 || end_logits.len() != n || is_context.len() != n {
        return None;
    }

    let mut normalize = is_context.to_vec();
    normalize[0] = true;
    let p_start = masked_softmax(start_logits, &normalize);
    let p_end = masked_softmax(end_logits, &normalize);

    let mut best: Option<Span> = None;
    for start in (0..n).filter(|&i| is_context[i]) {
        let last = (start + max_answer_len).min(n);
        for end in (start..last).filter(|&j| is_context[j]) {
            let score = p_start[start] * p_end[end];
            if best.map_or(true, |b| score > b.score) {
                best = Some(Span { start, end, score });
            }
        }
    }
    best
}

struct QaModel {
    tokenizer: Tokenizer,
    session: RefCell<Session<'static>>,
    start_output: usize,
    end_output: usize,
}

impl QaModel {
    fn load(assets: &ModelAssetsConfig, cfg: &ChatConfig) -> Result<Self, ChatError> {
        let timeout = Duration::from_secs(cfg.download_timeout_secs);
        let tokenizer_path = ensure_local_file(
            &assets.tokenizer_path,
            assets.tokenizer_url.as_deref(),
            timeout,
            || embed::EmbedError::TokenizerMissing(assets.tokenizer_path.display().to_string()),
        )?;
        let model_path = ensure_local_file(
            &assets.model_path,
            assets.model_url.as_deref(),
            timeout,
            || embed::EmbedError::ModelNotFound(assets.model_path.display().to_string()),
        )?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(ChatError::tokenizer)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: cfg.qa_max_seq_len,
                strategy: TruncationStrategy::OnlySecond,
                stride: cfg.doc_stride,
                ..Default::default()
            }))
            .map_err(ChatError::tokenizer)?;
        tokenizer.with_padding(None);

        let session = load_session(&model_path)?;
        let position = |name: &str, fallback: usize| {
            session
                .outputs
                .iter()
                .position(|o| o.name == name)
                .unwrap_or(fallback)
        };
        let start_output = position("start_logits", 0);
        let end_output = position("end_logits", 1);

        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
            start_output,
            end_output,
        })
    }

    fn window_logits(&self, window: &Encoding) -> Result<(Vec<f32>, Vec<f32>), ChatError> {
        let ids: Vec<i64> = window.get_ids().iter().map(|&x| x as i64).collect();
        let mask: Vec<i64> = window
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();

        let mut session = self.session.borrow_mut();
        let inputs = session_inputs(&session, &ids, &mask)?;
        let outputs = run_f32(&mut session, inputs)?;
        let take = |idx: usize| -> Result<Vec<f32>, ChatError> {
            outputs
                .get(idx)
                .map(|t: &OutputTensor| t.data.clone())
                .ok_or_else(|| ChatError::Inference(format!("model has no output #{idx}")))
        };
        Ok((take(self.start_output)?, take(self.end_output)?))
    }
}

/// Extractive QA with a SQuAD-tuned encoder (distilbert by default).
///
/// Long contexts are cut into overlapping windows; every window is scored and
/// the best span overall wins.
pub struct OnnxAnswerer {
    model: ModelHandle<QaModel, ChatError>,
    max_answer_len: usize,
}

impl OnnxAnswerer {
    /// Model files are resolved on first use (or on [`Answerer::warm_up`]).
    pub fn new(cfg: &ChatConfig) -> Self {
        let assets = cfg.qa.clone();
        let model_cfg = cfg.clone();
        Self {
            model: ModelHandle::new(move || QaModel::load(&assets, &model_cfg)),
            max_answer_len: cfg.max_answer_len,
        }
    }
}

impl Answerer for OnnxAnswerer {
    fn answer(&self, question: &str, context: &str) -> Result<String, ChatError> {
        let model = self.model.get()?;
        let encoding = model
            .tokenizer
            .encode((question, context), true)
            .map_err(ChatError::tokenizer)?;
        let windows: Vec<&Encoding> = iter::once(&encoding)
            .chain(encoding.get_overflowing().iter())
            .collect();
        debug!(windows = windows.len(), "qa_windows");

        let mut best: Option<(Span, &Encoding)> = None;
        for window in windows {
            let is_context: Vec<bool> = window
                .get_sequence_ids()
                .iter()
                .map(|s| *s == Some(1))
                .collect();
            let (start_logits, end_logits) = model.window_logits(window)?;
            if let Some(span) = best_span(&start_logits, &end_logits, &is_context, self.max_answer_len)
            {
                if best.map_or(true, |(b, _)| span.score > b.score) {
                    best = Some((span, window));
                }
            }
        }

        let (span, window) = best.ok_or(ChatError::NoAnswer)?;
        let offsets = window.get_offsets();
        let from = offsets.get(span.start).map(|o| o.0);
        let to = offsets.get(span.end).map(|o| o.1);
        match (from, to) {
            (Some(from), Some(to)) => context
                .get(from..to)
                .map(str::to_string)
                .ok_or(ChatError::NoAnswer),
            _ => Err(ChatError::NoAnswer),
        }
    }

    fn warm_up(&self) -> Result<(), ChatError> {
        self.model.get().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_product_inside_context() {
        // [CLS] q [SEP] c c c [SEP]
        let is_context = [false, false, false, true, true, true, false];
        let start = [9.0, 9.0, 0.0, 1.0, 5.0, 0.0, 9.0];
        let end = [9.0, 0.0, 0.0, 0.0, 1.0, 6.0, 9.0];
        let span = best_span(&start, &end, &is_context, 15).unwrap();
        assert_eq!((span.start, span.end), (4, 5));
    }

    #[test]
    fn end_never_precedes_start() {
        let is_context = [false, true, true];
        let start = [0.0, 0.0, 10.0];
        let end = [0.0, 10.0, 0.0];
        let span = best_span(&start, &end, &is_context, 15).unwrap();
        assert!(span.start <= span.end);
        assert_eq!(span.start, 2);
        assert_eq!(span.end, 2);
    }

    #[test]
    fn answer_length_is_capped() {
        let is_context = [false, true, true, true, true];
        let start = [0.0, 10.0, 0.0, 0.0, 0.0];
        let end = [0.0, 0.0, 0.0, 0.0, 10.0];
        let span = best_span(&start, &end, &is_context, 2).unwrap();
        assert!(span.end - span.start < 2);
    }

    #[test]
    fn no_context_tokens_means_no_span() {
        let is_context = [false, false];
        assert_eq!(best_span(&[1.0, 2.0], &[1.0, 2.0], &is_context, 15), None);
        assert_eq!(best_span(&[], &[], &[], 15), None);
    }

    #[test]
    fn masked_positions_get_zero_probability() {
        let probs = masked_softmax(&[100.0, 1.0, 1.0], &[false, true, true]);
        assert_eq!(probs[0], 0.0);
        assert!((probs[1] - 0.5).abs() < 1e-6);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    #[ignore = "requires distilbert-base-cased-distilled-squad ONNX assets"]
    fn answers_from_context() {
        let answerer = OnnxAnswerer::new(&ChatConfig::default());
        let answer = answerer
            .answer(
                "Who wrote the encyclopedia?",
                "The encyclopedia was written by a team of psychologists in Detroit.",
            )
            .unwrap();
        assert!(answer.contains("psychologists"));
    }
}
