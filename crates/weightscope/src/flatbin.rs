//! Headerless `f32` parameter files.
//!
//! A flat file is the parameter's values as consecutive little-endian `f32`s
//! in row-major order. Shape and dtype are not stored; the conversion
//! manifest carries them.

use crate::error::{Result, WeightscopeError};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// File extension used for flat parameter files.
pub const EXTENSION: &str = "bin";

/// Write `values` to `path`, replacing any existing file.
pub fn write_f32_file(path: &Path, values: &[f32]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for v in values {
        out.write_all(&v.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Read a whole flat file back into memory.
pub fn read_f32_file(path: &Path) -> Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(WeightscopeError::Truncated {
            path: path.display().to_string(),
            len: bytes.len() as u64,
        });
    }
    Ok(bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}

/// File name for a parameter: path separators become `_` so every file
/// lands directly in the output directory.
pub fn file_name_for(param: &str) -> String {
    let flat: String = param.chars().map(|c| if matches!(c, '/' | '\\') { '_' } else { c }).collect();
    format!("{flat}.{EXTENSION}")
}
