//! JSON sidecar cache for computed histograms.

use super::{Histogram, HistogramSpec};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Whether a plot run reused a cached histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// File stem that identifies `(pattern, n_bins, cutoff)`.
///
/// The pattern is kept readable where it is filename-safe; a digest prefix of
/// the raw pattern keeps patterns that sanitize alike apart.
pub fn cache_file_name(spec: &HistogramSpec) -> String {
    let readable: String = spec
        .pattern
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let digest = format!("{:x}", Sha256::digest(spec.pattern.as_bytes()));
    let cutoff = match spec.cutoff {
        Some(c) => c.to_string(),
        None => "none".to_string(),
    };
    format!("hist_{readable}_{}_b{}_c{cutoff}", &digest[..8], spec.n_bins)
}

/// Read a cached histogram; `None` when no cache file exists.
pub fn load_cached(path: &Path) -> Result<Option<Histogram>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

/// Persist a histogram, creating the cache directory if needed.
///
/// The JSON goes to a sibling `.tmp` file first and is renamed into place, so
/// an interrupted run never leaves a partial cache behind.
pub fn store_cached(path: &Path, histogram: &Histogram) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, serde_json::to_string(histogram)?)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
