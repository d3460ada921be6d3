//! pdfchat extraction layer
//!
//! Reads a fixed list of PDFs and turns them into paragraph-sized
//! [`DocumentChunk`]s tagged with the file name and 1-based page number.
//!
//! ## How it works
//!
//! - Each file goes through a [`PageSource`] (pdf-extract in production) that
//!   yields raw text per page. We don't touch the layout: ligatures and odd
//!   whitespace come through as-is.
//! - Page text is split on blank lines. A paragraph is kept only if its trimmed
//!   length is over 50 characters, which throws out headers, footers and page
//!   numbers (and occasionally a short real paragraph; that's the trade).
//! - Failures are per file. A missing or unparseable PDF lands in
//!   [`ExtractionReport::failures`], gets a `warn!`, and the next file is tried.
//!
//! The chat side wants the opposite shape, one big string with every page
//! glued together, so [`load_raw_text`] provides that with the same isolation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn, Level};

mod config;
mod error;
mod pdf;

pub use crate::config::ExtractConfig;
pub use crate::error::{ConfigError, ExtractError};
pub use crate::pdf::{parse_pages, PageSource, PdfPageSource};
pub use knowledge::DocumentChunk;

/// The two documents the demo ships with, relative to the working directory.
pub const DEFAULT_DOCUMENTS: [&str; 2] = [
    "data/ebooks_academic_geop4e_frontmatter.pdf",
    "data/Gale-Encyclopedia-of-Psychology-2nd-ed.-2001.pdf",
];

pub fn default_document_paths() -> Vec<PathBuf> {
    DEFAULT_DOCUMENTS.iter().map(PathBuf::from).collect()
}

/// A document that could not be read, and why.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Chunks from every readable file plus one entry per file that failed.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub chunks: Vec<DocumentChunk>,
    pub failures: Vec<FileFailure>,
}

impl ExtractionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Concatenated page text of every readable file.
#[derive(Debug, Clone, Default)]
pub struct RawText {
    pub text: String,
    pub failures: Vec<FileFailure>,
}

/// Split one page into trimmed paragraphs that pass the length filter.
pub fn split_paragraphs<'a>(
    page_text: &'a str,
    cfg: &'a ExtractConfig,
) -> impl Iterator<Item = &'a str> + 'a {
    page_text
        .split(cfg.paragraph_separator.as_str())
        .map(str::trim)
        .filter(move |para| para.chars().count() > cfg.min_paragraph_chars)
}

/// Extract paragraph chunks from `paths`, in file then page order.
///
/// Never fails as a whole: per-file errors are collected in the report.
pub fn extract_chunks<P, S>(paths: &[P], source: &S, cfg: &ExtractConfig) -> ExtractionReport
where
    P: AsRef<Path>,
    S: PageSource + ?Sized,
{
    let mut report = ExtractionReport::default();

    for path in paths {
        let path = path.as_ref();
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "extract.file", path = %path.display());
        let _guard = span.enter();

        let pages = match source.page_texts(path) {
            Ok(pages) => pages,
            Err(error) => {
                warn!(
                    error = %error,
                    elapsed_micros = start.elapsed().as_micros(),
                    "extract_file_failure"
                );
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
                continue;
            }
        };

        let name = source_name(path);
        let before = report.chunks.len();
        for (idx, text) in pages.iter().enumerate() {
            let page = idx as u32 + 1;
            let kept_before = report.chunks.len();
            report.chunks.extend(
                split_paragraphs(text, cfg).map(|para| DocumentChunk::new(para, name.clone(), page)),
            );
            debug!(page, kept = report.chunks.len() - kept_before, "extract_page");
        }

        info!(
            source = %name,
            pages = pages.len(),
            chunks = report.chunks.len() - before,
            elapsed_micros = start.elapsed().as_micros(),
            "extract_file_success"
        );
    }

    report
}

/// Concatenate the raw text of every page of every file, with no separators.
pub fn load_raw_text<P, S>(paths: &[P], source: &S) -> RawText
where
    P: AsRef<Path>,
    S: PageSource + ?Sized,
{
    let mut raw = RawText::default();
    for path in paths {
        let path = path.as_ref();
        match source.page_texts(path) {
            Ok(pages) => {
                for page in &pages {
                    raw.text.push_str(page);
                }
                info!(path = %path.display(), pages = pages.len(), "raw_text_loaded");
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "raw_text_failure");
                raw.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }
    raw
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
