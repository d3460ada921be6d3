//! End-to-end preprocess runs over in-memory PDFs and the stub embedder.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use pdfchat::{
    read_knowledge_base, run_preprocess, Embedder, ExtractError, PageSource, PdfchatConfig,
    Stage, StubEmbedder,
};

/// Page text keyed by path; anything not listed is missing.
#[derive(Default)]
struct MemoryPdfs(HashMap<PathBuf, Vec<String>>);

impl MemoryPdfs {
    fn with(mut self, path: &Path, pages: &[&str]) -> Self {
        self.0
            .insert(path.to_path_buf(), pages.iter().map(|p| p.to_string()).collect());
        self
    }
}

impl PageSource for MemoryPdfs {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| ExtractError::NotFound(path.display().to_string()))
    }
}

const EIGHTY: &str =
    "Memory is the faculty by which the brain encodes, stores, and retrieves info....";

fn config(dir: &Path, paths: Vec<PathBuf>) -> PdfchatConfig {
    let mut cfg = PdfchatConfig::default();
    cfg.documents.paths = paths;
    cfg.embedding.mode = "fast".into();
    cfg.embedding.stub_dimension = 32;
    cfg.output.knowledge_base_path = dir.join("processed_data").join("knowledge_base.json");
    cfg
}

#[test]
fn missing_file_and_short_paragraph_leave_one_chunk() {
    assert_eq!(EIGHTY.chars().count(), 80);

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("data/gone.pdf");
    let present = dir.path().join("data/psych.pdf");
    let page = format!("Short.\n\n{EIGHTY}");
    let pdfs = MemoryPdfs::default().with(&present, &[page.as_str()]);
    let cfg = config(dir.path(), vec![missing.clone(), present]);

    let summary = run_preprocess(&cfg, &pdfs, &StubEmbedder::new(32), |_| {}).unwrap();

    assert_eq!(summary.chunk_count, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, missing);
    assert_eq!(summary.dimension, Some(32));

    let kb = read_knowledge_base(&summary.output_path).unwrap();
    let chunk = &kb.chunks()[0];
    assert_eq!(chunk.content, EIGHTY);
    assert_eq!(chunk.source, "psych.pdf");
    assert_eq!(chunk.page, 1);
    assert_eq!(chunk.embedding.len(), 32);
}

#[test]
fn empty_document_list_writes_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), Vec::new());

    let summary = run_preprocess(&cfg, &MemoryPdfs::default(), &StubEmbedder::new(32), |_| {})
        .unwrap();

    assert_eq!(summary.chunk_count, 0);
    assert!(summary.failures.is_empty());
    assert_eq!(summary.dimension, None);
    assert_eq!(fs::read_to_string(&summary.output_path).unwrap(), "[]");
}

#[test]
fn written_knowledge_base_round_trips_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    let para = |n: u32| format!("Paragraph number {n} is long enough to pass the length filter easily.");
    let page_one = format!("{}\n\n{}", para(1), para(2));
    let page_two = para(3);
    let other = para(4);
    let pdfs = MemoryPdfs::default()
        .with(&a, &[page_one.as_str(), page_two.as_str()])
        .with(&b, &[other.as_str()]);
    let cfg = config(dir.path(), vec![a, b]);

    let summary = run_preprocess(&cfg, &pdfs, &StubEmbedder::new(32), |_| {}).unwrap();
    let kb = read_knowledge_base(&summary.output_path).unwrap();

    let order: Vec<(String, u32, String)> = kb
        .iter()
        .map(|c| (c.source.clone(), c.page, c.content.clone()))
        .collect();
    let expected: Vec<(String, u32, String)> = vec![
        ("a.pdf".into(), 1, para(1)),
        ("a.pdf".into(), 1, para(2)),
        ("a.pdf".into(), 2, para(3)),
        ("b.pdf".into(), 1, para(4)),
    ];
    assert_eq!(order, expected);

    // Same text through the same stub gives the same bits back.
    let stub = StubEmbedder::new(32);
    for chunk in kb.iter() {
        assert_eq!(chunk.embedding, stub.embed(&chunk.content).unwrap());
    }
}

#[test]
fn stages_are_reported_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.pdf");
    let two = format!("{EIGHTY}\n\n{EIGHTY}");
    let pdfs = MemoryPdfs::default().with(&a, &[two.as_str()]);
    let cfg = config(dir.path(), vec![a]);

    let mut stages = Vec::new();
    run_preprocess(&cfg, &pdfs, &StubEmbedder::new(32), |s| stages.push(s)).unwrap();

    assert_eq!(
        stages,
        vec![
            Stage::Extracting,
            Stage::Embedding { total: 2 },
            Stage::Embedded { done: 1, total: 2 },
            Stage::Embedded { done: 2, total: 2 },
            Stage::Saving,
        ]
    );
}

#[test]
fn rerun_overwrites_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.pdf");
    let pdfs = MemoryPdfs::default().with(&a, &[EIGHTY]);

    let cfg = config(dir.path(), vec![a]);
    run_preprocess(&cfg, &pdfs, &StubEmbedder::new(32), |_| {}).unwrap();

    let empty = config(dir.path(), Vec::new());
    let summary = run_preprocess(&empty, &pdfs, &StubEmbedder::new(32), |_| {}).unwrap();
    assert!(read_knowledge_base(&summary.output_path).unwrap().is_empty());
}
