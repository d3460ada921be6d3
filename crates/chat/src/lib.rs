//! pdfchat chat layer
//!
//! A tiny rule-based router in front of two models:
//!
//! - a message mentioning "health tip" (any case) gets a canned tip;
//! - otherwise, if there is PDF text loaded, extractive QA pulls the answer
//!   span out of it ([`OnnxAnswerer`]);
//! - with no PDF text, a causal language model continues the prompt
//!   ([`OnnxGenerator`]).
//!
//! Model failures never reach the user as errors; [`ChatRouter::respond`]
//! turns them into an apology message. Conversations are plain
//! [`ChatSession`] values owned by the caller.
//!
//! Models sit behind [`ModelHandle`]s and load on first use.
//! [`ChatRouter::warm_up`] forces the load so a missing model is caught at
//! startup instead of on the first question.

mod config;
mod error;
mod generate;
mod handle;
mod qa;
mod router;
mod session;

pub use crate::config::{ChatConfig, ModelAssetsConfig};
pub use crate::error::ChatError;
pub use crate::generate::{banned_ngram_tokens, greedy_decode, OnnxGenerator};
pub use crate::handle::ModelHandle;
pub use crate::qa::{best_span, OnnxAnswerer, Span};
pub use crate::router::{Answerer, ChatRouter, Generator, Route};
pub use crate::session::{ChatMessage, ChatSession, Role};

/// Router wired to the ONNX answerer and generator described by `cfg`.
///
/// Nothing is loaded yet; call [`ChatRouter::warm_up`] to load both models.
pub fn onnx_router(context: impl Into<String>, cfg: ChatConfig) -> Result<ChatRouter, ChatError> {
    cfg.validate()?;
    let answerer = OnnxAnswerer::new(&cfg);
    let generator = OnnxGenerator::new(&cfg);
    Ok(ChatRouter::new(
        context,
        Box::new(answerer),
        Box::new(generator),
        cfg,
    ))
}
