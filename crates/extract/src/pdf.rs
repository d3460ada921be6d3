use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::ExtractError;

/// Turns one document into per-page raw text.
///
/// Layout reconstruction belongs to whatever sits behind this trait; callers take
/// the strings as-is, including stray whitespace and ligature artifacts.
pub trait PageSource {
    /// Text of every page in `path`, in page order.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        (**self).page_texts(path)
    }
}

impl<T: PageSource + ?Sized> PageSource for Box<T> {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        (**self).page_texts(path)
    }
}

/// [`PageSource`] backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfPageSource;

impl PageSource for PdfPageSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let bytes = fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ExtractError::NotFound(path.display().to_string()),
            _ => ExtractError::Io(err),
        })?;
        parse_pages(&bytes)
    }
}

/// Run the parser over an in-memory PDF.
///
/// pdf-extract panics on some malformed font and encoding tables; the panic is
/// converted into a parse error so it stays scoped to this one file.
pub fn parse_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(err)) => Err(ExtractError::Parse(err.to_string())),
        Err(payload) => Err(ExtractError::Parse(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "parser panicked".to_string()
    }
}
