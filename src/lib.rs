//! pdfchat
//!
//! Offline preprocessing for a small PDF chatbot: read a fixed set of PDFs,
//! cut their pages into paragraph chunks, embed each chunk with a sentence
//! encoder and write the lot to a JSON knowledge base.
//!
//! The stages live in their own crates and are re-exported here:
//!
//! | Stage      | Crate       | Output                          |
//! |------------|-------------|---------------------------------|
//! | extract    | `extract`   | `Vec<DocumentChunk>` + failures |
//! | embed      | `embed`     | `KnowledgeBase`                 |
//! | persist    | `knowledge` | `knowledge_base.json`           |
//!
//! [`run_preprocess`] wires them together strictly in that order. Per-file
//! extraction problems are reported and skipped; an embedding or write error
//! ends the run.
//!
//! ```no_run
//! use pdfchat::{load_embedder, run_preprocess, PdfPageSource, PdfchatConfig};
//!
//! let cfg = PdfchatConfig::load_or_default("pdfchat.yaml")?;
//! let embedder = load_embedder(&cfg.embedding)?;
//! let summary = run_preprocess(&cfg, &PdfPageSource, &embedder, |_| {})?;
//! println!("{} chunks -> {}", summary.chunk_count, summary.output_path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

pub mod config;

pub use crate::config::{
    ConfigLoadError, DocumentsYamlConfig, OutputYamlConfig, PdfchatConfig, DEFAULT_CONFIG_FILE,
};
pub use embed::{
    embed_chunks, load_embedder, EmbedConfig, EmbedError, Embedder, OnnxEmbedder, StubEmbedder,
};
pub use extract::{
    extract_chunks, load_raw_text, split_paragraphs, ConfigError as ExtractConfigError,
    ExtractConfig, ExtractError, ExtractionReport, FileFailure, PageSource, PdfPageSource,
};
pub use knowledge::{
    read_knowledge_base, write_knowledge_base, DocumentChunk, EmbeddedChunk, KnowledgeBase,
    KnowledgeError, DEFAULT_KNOWLEDGE_BASE_PATH,
};

/// Errors that end a preprocess run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid extract config: {0}")]
    Extract(#[from] ExtractConfigError),

    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("failed to write knowledge base: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    Config(#[from] ConfigLoadError),
}

/// Where a run is, reported through the `on_progress` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    /// Extraction finished with `total` chunks to embed.
    Embedding { total: usize },
    /// `done` of `total` chunks have vectors.
    Embedded { done: usize, total: usize },
    Saving,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub chunk_count: usize,
    /// Files that were skipped, with the reason.
    pub failures: Vec<FileFailure>,
    /// Embedding length, `None` when no chunks were produced.
    pub dimension: Option<usize>,
    pub output_path: PathBuf,
}

/// Extract, embed and persist, in that order.
///
/// `on_progress` sees every [`Stage`] in order, with one
/// [`Stage::Embedded`] per chunk.
pub fn run_preprocess<S, E, F>(
    cfg: &PdfchatConfig,
    source: &S,
    embedder: &E,
    mut on_progress: F,
) -> Result<PreprocessSummary, PipelineError>
where
    S: PageSource + ?Sized,
    E: Embedder + ?Sized,
    F: FnMut(Stage),
{
    let start = Instant::now();
    cfg.validate()?;
    let extract_cfg = cfg.extract_config();
    extract_cfg.validate()?;

    on_progress(Stage::Extracting);
    let report = extract_chunks(&cfg.documents.paths, source, &extract_cfg);
    for failure in &report.failures {
        warn!(
            path = %failure.path.display(),
            error = %failure.error,
            "preprocess_file_skipped"
        );
    }

    let total = report.chunks.len();
    info!(chunks = total, files_failed = report.failures.len(), "preprocess_extracted");

    on_progress(Stage::Embedding { total });
    let kb = embed_chunks(report.chunks, embedder, |done, _| {
        on_progress(Stage::Embedded { done, total })
    })?;

    on_progress(Stage::Saving);
    let output_path = cfg.output.knowledge_base_path.clone();
    write_knowledge_base(&output_path, &kb)?;

    info!(
        chunks = kb.len(),
        output = %output_path.display(),
        elapsed_micros = start.elapsed().as_micros(),
        "preprocess_complete"
    );

    Ok(PreprocessSummary {
        chunk_count: kb.len(),
        failures: report.failures,
        dimension: kb.dimension(),
        output_path,
    })
}
