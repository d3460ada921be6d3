use std::cell::RefCell;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use embed::runtime::{load_session, run_f32, session_inputs};
use embed::{ensure_local_file, EmbedError};
use onnxruntime::session::Session;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::router::Generator;
use crate::{ChatConfig, ChatError, ModelHandle};

/// Tokens that would complete an `n`-gram already present in `ids`.
///
/// `n == 0` disables the check. With `n == 1` every token seen so far is banned.
pub fn banned_ngram_tokens(ids: &[u32], n: usize) -> HashSet<u32> {
    let mut banned = HashSet::new();
    if n == 0 || ids.len() + 1 < n {
        return banned;
    }
    let prefix = &ids[ids.len() + 1 - n..];
    for window in ids.windows(n) {
        if &window[..n - 1] == prefix {
            banned.insert(window[n - 1]);
        }
    }
    banned
}

/// Greedy decoding: repeatedly append the highest-scoring allowed token.
///
/// `next_logits` receives the whole sequence so far and returns scores over
/// the vocabulary for the next position. Decoding stops at `eos` (which is
/// kept), when `max_length` tokens exist, or when every token is banned.
pub fn greedy_decode<F>(
    prompt: &[u32],
    max_length: usize,
    eos: Option<u32>,
    no_repeat_ngram_size: usize,
    mut next_logits: F,
) -> Result<Vec<u32>, ChatError>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>, ChatError>,
{
    let mut ids = prompt.to_vec();
    while ids.len() < max_length {
        let logits = next_logits(&ids)?;
        let banned = banned_ngram_tokens(&ids, no_repeat_ngram_size);

        let next = logits
            .iter()
            .enumerate()
            .filter(|(tok, score)| !banned.contains(&(*tok as u32)) && !score.is_nan())
            .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(tok, _)| tok as u32);

        let Some(next) = next else {
            debug!(len = ids.len(), "generate_all_tokens_banned");
            break;
        };
        ids.push(next);
        if Some(next) == eos {
            break;
        }
    }
    Ok(ids)
}

struct LmModel {
    tokenizer: Tokenizer,
    session: RefCell<Session<'static>>,
    eos: Option<u32>,
}

impl LmModel {
    fn load(cfg: &ChatConfig) -> Result<Self, ChatError> {
        let assets = &cfg.generator;
        let timeout = Duration::from_secs(cfg.download_timeout_secs);
        let tokenizer_path = ensure_local_file(
            &assets.tokenizer_path,
            assets.tokenizer_url.as_deref(),
            timeout,
            || EmbedError::TokenizerMissing(assets.tokenizer_path.display().to_string()),
        )?;
        let model_path = ensure_local_file(
            &assets.model_path,
            assets.model_url.as_deref(),
            timeout,
            || EmbedError::ModelNotFound(assets.model_path.display().to_string()),
        )?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(ChatError::tokenizer)?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(ChatError::tokenizer)?;
        let eos = tokenizer.token_to_id(&cfg.eos_token);

        let session = load_session(&model_path)?;
        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
            eos,
        })
    }

    /// Logits for the position after `ids`. No key/value cache: the whole
    /// sequence is run every step.
    fn next_logits(&self, ids: &[u32]) -> Result<Vec<f32>, ChatError> {
        let ids: Vec<i64> = ids.iter().map(|&x| x as i64).collect();
        let mask = vec![1_i64; ids.len()];

        let mut session = self.session.borrow_mut();
        let inputs = session_inputs(&session, &ids, &mask)?;
        let outputs = run_f32(&mut session, inputs)?;
        let logits = outputs
            .first()
            .ok_or_else(|| ChatError::Inference("model returned no outputs".into()))?;
        let last = ids.len().saturating_sub(1);
        logits
            .row(last)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| {
                ChatError::Inference(format!("unexpected logits shape {:?}", logits.shape))
            })
    }
}

/// Causal LM text continuation (GPT-2 by default).
pub struct OnnxGenerator {
    model: ModelHandle<LmModel, ChatError>,
    max_length: usize,
    no_repeat_ngram_size: usize,
}

impl OnnxGenerator {
    pub fn new(cfg: &ChatConfig) -> Self {
        let model_cfg = cfg.clone();
        Self {
            model: ModelHandle::new(move || LmModel::load(&model_cfg)),
            max_length: cfg.max_length,
            no_repeat_ngram_size: cfg.no_repeat_ngram_size,
        }
    }
}

impl Generator for OnnxGenerator {
    /// The returned text starts with the prompt itself.
    fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let model = self.model.get()?;
        let start = Instant::now();
        let encoding = model
            .tokenizer
            .encode(prompt, true)
            .map_err(ChatError::tokenizer)?;
        let prompt_ids = encoding.get_ids();
        if prompt_ids.is_empty() {
            return Ok(String::new());
        }

        let ids = greedy_decode(
            prompt_ids,
            self.max_length,
            model.eos,
            self.no_repeat_ngram_size,
            |seq| model.next_logits(seq),
        )?;
        info!(
            prompt_tokens = prompt_ids.len(),
            new_tokens = ids.len() - prompt_ids.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "generate_complete"
        );

        model
            .tokenizer
            .decode(&ids, true)
            .map_err(ChatError::tokenizer)
    }

    fn warm_up(&self) -> Result<(), ChatError> {
        self.model.get().map(|_| ())
    }
}
