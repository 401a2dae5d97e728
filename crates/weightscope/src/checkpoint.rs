//! SafeTensors checkpoint access.
//!
//! A [`Checkpoint`] memory-maps the file once and exposes the parameters in
//! storage order. Values are decoded on demand and always widened or narrowed
//! to `f32`, which is the only element type the rest of the crate works with.

use crate::error::{Result, WeightscopeError};
use half::{bf16, f16};
use memmap2::Mmap;
use ndarray::{ArrayD, IxDyn};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Name, element type and shape of one stored parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub dtype: Dtype,
    pub shape: Vec<usize>,
}

impl ParamInfo {
    /// Number of elements (1 for a scalar).
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Shape rendered the way PyTorch prints `torch.Size`.
    pub fn shape_string(&self) -> String {
        let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
        format!("[{}]", dims.join(", "))
    }

    pub fn dtype_name(&self) -> String {
        format!("{:?}", self.dtype)
    }
}

/// A read-only, memory-mapped SafeTensors checkpoint.
pub struct Checkpoint {
    path: PathBuf,
    mmap: Mmap,
    params: Vec<ParamInfo>,
}

impl Checkpoint {
    /// Open a checkpoint file, or the first `*.safetensors` file of a directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_checkpoint_path(path.as_ref())?;
        let file = File::open(&path)?;
        // The map is read-only and lives as long as the checkpoint.
        let mmap = unsafe { Mmap::map(&file)? };

        let (_, metadata) = SafeTensors::read_metadata(&mmap)?;
        let mut entries: Vec<(usize, ParamInfo)> = metadata
            .tensors()
            .into_iter()
            .map(|(name, info)| {
                (
                    info.data_offsets.0,
                    ParamInfo { name, dtype: info.dtype, shape: info.shape.clone() },
                )
            })
            .collect();
        // Storage order; zero-sized tensors share offsets so break ties by name.
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        let params: Vec<ParamInfo> = entries.into_iter().map(|(_, p)| p).collect();

        tracing::debug!(path = %path.display(), params = params.len(), "opened checkpoint");

        Ok(Self { path, mmap, params })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parameters in storage order.
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Total number of scalar values across all parameters.
    pub fn total_elements(&self) -> usize {
        self.params.iter().map(ParamInfo::numel).sum()
    }

    /// Look up a parameter by exact name.
    pub fn get(&self, name: &str) -> Result<&ParamInfo> {
        self.params.iter().find(|p| p.name == name).ok_or_else(|| {
            WeightscopeError::ParamNotFound { name: name.to_string(), available: self.params.len() }
        })
    }

    /// Decode one parameter as a flat row-major `f32` vector.
    pub fn read_f32(&self, name: &str) -> Result<Vec<f32>> {
        self.get(name)?;
        let st = SafeTensors::deserialize(&self.mmap)?;
        let view = st.tensor(name)?;
        view_to_f32(name, &view)
    }

    /// Decode one parameter as an `f32` array with its stored shape.
    pub fn read_array(&self, name: &str) -> Result<ArrayD<f32>> {
        let info = self.get(name)?;
        let values = self.read_f32(name)?;
        Ok(ArrayD::from_shape_vec(IxDyn(&info.shape), values)?)
    }

    /// Visit every parameter in storage order with its decoded values.
    ///
    /// The header is parsed once; only one tensor's values are alive at a time.
    pub fn for_each_f32<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&ParamInfo, Vec<f32>) -> Result<()>,
    {
        let st = SafeTensors::deserialize(&self.mmap)?;
        for info in &self.params {
            let view = st.tensor(&info.name)?;
            let values = view_to_f32(&info.name, &view)?;
            visit(info, values)?;
        }
        Ok(())
    }
}

/// Resolve a checkpoint path: files are used as-is, directories yield their
/// first `*.safetensors` entry by name.
pub fn resolve_checkpoint_path(input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        let mut candidates: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "safetensors"))
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| WeightscopeError::NoCheckpoint(input.display().to_string()))
    } else {
        // Missing files surface as the I/O error from opening them.
        Ok(input.to_path_buf())
    }
}

/// Cast a tensor view to `f32`, reading little-endian elements byte-wise so
/// unaligned payloads are fine.
pub fn view_to_f32(name: &str, view: &TensorView<'_>) -> Result<Vec<f32>> {
    let data = view.data();
    let values = match view.dtype() {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F64 => data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        Dtype::F16 => {
            data.chunks_exact(2).map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32()).collect()
        }
        Dtype::BF16 => {
            data.chunks_exact(2).map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f32()).collect()
        }
        Dtype::I64 => data
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        Dtype::U64 => data
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        Dtype::I32 => data
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
            .collect(),
        Dtype::U32 => data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
            .collect(),
        Dtype::I16 => {
            data.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]]) as f32).collect()
        }
        Dtype::U16 => {
            data.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]) as f32).collect()
        }
        Dtype::I8 => data.iter().map(|&b| b as i8 as f32).collect(),
        Dtype::U8 => data.iter().map(|&b| b as f32).collect(),
        Dtype::BOOL => data.iter().map(|&b| if b != 0 { 1.0 } else { 0.0 }).collect(),
        other => {
            return Err(WeightscopeError::UnsupportedDtype {
                name: name.to_string(),
                dtype: format!("{other:?}"),
            });
        }
    };
    Ok(values)
}
