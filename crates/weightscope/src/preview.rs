//! Top-left previews of a parameter.

use crate::checkpoint::{Checkpoint, ParamInfo};
use crate::error::{Result, WeightscopeError};
use ndarray::{ArrayD, Slice};
use std::fmt;

/// Default number of rows/columns shown.
pub const DEFAULT_WINDOW: usize = 5;

/// A parameter's leading sub-block.
#[derive(Debug, Clone)]
pub struct Preview {
    pub info: ParamInfo,
    pub window: usize,
    pub block: ArrayD<f32>,
}

impl Preview {
    /// Load `name` from the checkpoint and cut out its top-left block.
    pub fn load(checkpoint: &Checkpoint, name: &str, window: usize) -> Result<Self> {
        if window == 0 {
            return Err(WeightscopeError::EmptyWindow);
        }
        let info = checkpoint.get(name)?.clone();
        let array = checkpoint.read_array(name)?;
        let block = top_left(&array, window)?;
        tracing::debug!(param = name, shape = ?block.shape(), "preview block");
        Ok(Self { info, window, block })
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {} (showing {:?})",
            self.info.name,
            self.info.dtype_name(),
            self.info.shape_string(),
            self.block.shape()
        )?;
        write!(f, "{:.4}", self.block)
    }
}

/// Slice the first `window` entries of the two leading axes, NumPy `t[:n, :n]`
/// style. Trailing axes are kept whole; scalars come back unchanged.
pub fn top_left(array: &ArrayD<f32>, window: usize) -> Result<ArrayD<f32>> {
    if window == 0 {
        return Err(WeightscopeError::EmptyWindow);
    }
    let block = array.slice_each_axis(|ax| {
        if ax.axis.index() < 2 {
            Slice::from(0..ax.len.min(window))
        } else {
            Slice::from(..)
        }
    });
    Ok(block.to_owned())
}
