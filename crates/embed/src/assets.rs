use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::{EmbedConfig, EmbedError};

#[derive(Debug)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Ensures that the model and tokenizer exist locally, downloading them when URLs are provided.
pub(crate) fn resolve_model_assets(cfg: &EmbedConfig) -> Result<ModelAssets, EmbedError> {
    let timeout = Duration::from_secs(cfg.download_timeout_secs);

    let model_path = ensure_local_file(&cfg.model_path, cfg.model_url.as_deref(), timeout, || {
        EmbedError::ModelNotFound(cfg.model_path.display().to_string())
    })?;
    let tokenizer_path =
        ensure_local_file(&cfg.tokenizer_path, cfg.tokenizer_url.as_deref(), timeout, || {
            EmbedError::TokenizerMissing(cfg.tokenizer_path.display().to_string())
        })?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

/// Returns `target` if it already exists, otherwise attempts to download `remote_url`.
pub fn ensure_local_file<F>(
    target: &Path,
    remote_url: Option<&str>,
    timeout: Duration,
    on_missing: F,
) -> Result<PathBuf, EmbedError>
where
    F: FnOnce() -> EmbedError,
{
    if target.exists() {
        return Ok(target.to_path_buf());
    }

    if let Some(url) = remote_url {
        download_to_path(target, url, timeout)?;
        return Ok(target.to_path_buf());
    }

    Err(on_missing())
}

/// Downloads `url` into `target`, creating parent directories as needed.
fn download_to_path(target: &Path, url: &str, timeout: Duration) -> Result<(), EmbedError> {
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    info!(url, target = %target.display(), "asset_download_start");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EmbedError::Download(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| EmbedError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EmbedError::Download(format!(
            "unexpected status {status} while fetching {url}"
        )));
    }

    let bytes = response
        .bytes()
        .map_err(|e| EmbedError::Download(e.to_string()))?;

    fs::write(target, &bytes)?;
    info!(bytes = bytes.len(), target = %target.display(), "asset_download_done");
    Ok(())
}
