//! Checkpoint to flat-file export.

use crate::checkpoint::Checkpoint;
use crate::error::{Result, WeightscopeError};
use crate::flatbin::{file_name_for, write_f32_file};
use safetensors::Dtype;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Sidecar written next to the flat files.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One exported parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    /// Element type in the source checkpoint; the flat file is always `f32`.
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub file: String,
}

impl ManifestEntry {
    pub fn byte_len(&self) -> u64 {
        self.shape.iter().product::<usize>() as u64 * 4
    }
}

/// Record of a conversion run, enough to reinterpret every flat file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub source: String,
    pub tool_version: String,
    pub tensors: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read `manifest.json` from a conversion output directory.
    pub fn load(out_dir: &Path) -> Result<Self> {
        let text = fs::read_to_string(out_dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.tensors.iter().find(|e| e.name == name)
    }

    pub fn total_bytes(&self) -> u64 {
        self.tensors.iter().map(ManifestEntry::byte_len).sum()
    }
}

/// Write every parameter of `checkpoint` to `<out_dir>/<name>.bin` as `f32`.
///
/// `on_written` is called after each file is closed. Files written before a
/// failure are left in place; re-running overwrites them. Names that flatten
/// to the same file are rejected before anything is written.
pub fn convert_checkpoint<F>(checkpoint: &Checkpoint, out_dir: &Path, mut on_written: F) -> Result<Manifest>
where
    F: FnMut(&ManifestEntry),
{
    check_file_names(checkpoint)?;
    fs::create_dir_all(out_dir)?;
    tracing::info!(
        source = %checkpoint.path().display(),
        out_dir = %out_dir.display(),
        params = checkpoint.len(),
        "converting checkpoint to flat f32 files"
    );

    let mut tensors = Vec::with_capacity(checkpoint.len());
    checkpoint.for_each_f32(|info, values| {
        let file = file_name_for(&info.name);
        write_f32_file(&out_dir.join(&file), &values)?;
        let entry = ManifestEntry {
            name: info.name.clone(),
            dtype: info.dtype,
            shape: info.shape.clone(),
            file,
        };
        tracing::debug!(param = %entry.name, file = %entry.file, "wrote flat file");
        on_written(&entry);
        tensors.push(entry);
        Ok(())
    })?;

    let manifest = Manifest {
        source: checkpoint.path().display().to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        tensors,
    };
    fs::write(out_dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;

    Ok(manifest)
}

/// Every parameter must get its own flat file.
fn check_file_names(checkpoint: &Checkpoint) -> Result<()> {
    let mut claimed: HashMap<String, &str> = HashMap::with_capacity(checkpoint.len());
    for info in checkpoint.params() {
        let file = file_name_for(&info.name);
        if let Some(first) = claimed.get(&file) {
            return Err(WeightscopeError::NameCollision {
                first: first.to_string(),
                second: info.name.clone(),
                file,
            });
        }
        claimed.insert(file, &info.name);
    }
    Ok(())
}
