//! Build `processed_data/knowledge_base.json` from the configured PDFs.
//!
//! No flags. Settings come from `pdfchat.yaml` in the working directory when
//! it exists, otherwise the defaults. `RUST_LOG` controls log verbosity.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use pdfchat::{load_embedder, run_preprocess, PdfPageSource, PdfchatConfig, Stage, DEFAULT_CONFIG_FILE};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = PdfchatConfig::load_or_default(DEFAULT_CONFIG_FILE)
        .with_context(|| format!("loading {DEFAULT_CONFIG_FILE}"))?;

    // Model load failures stop the run before any PDF is touched.
    let embedder = load_embedder(&cfg.embedding).context("loading embedding model")?;

    let bar = ProgressBar::hidden();
    let summary = run_preprocess(&cfg, &PdfPageSource, &embedder, |stage| match stage {
        Stage::Extracting => println!("Extracting text from PDFs..."),
        Stage::Embedding { total } => {
            println!("Creating embeddings...");
            bar.set_length(total as u64);
            bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            if let Ok(style) =
                ProgressStyle::default_bar().template("{bar:40.green} {pos}/{len} [{elapsed_precise}]")
            {
                bar.set_style(style);
            }
        }
        Stage::Embedded { done, .. } => bar.set_position(done as u64),
        Stage::Saving => {
            bar.finish_and_clear();
            println!("Saving processed data...");
        }
    })?;

    for failure in &summary.failures {
        eprintln!("Skipped {}: {}", failure.path.display(), failure.error);
    }
    println!(
        "Preprocessing complete! Knowledge base saved to {}",
        summary.output_path.display()
    );
    Ok(())
}
