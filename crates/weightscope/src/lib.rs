//! Weightscope: checkpoint inspection toolkit
//!
//! This crate provides the pieces behind the `weightscope` binary:
//! - [`checkpoint`]: memory-mapped SafeTensors access with `f32` casting
//! - [`preview`]: top-left sub-blocks of a parameter
//! - [`flatbin`] and [`convert`]: headerless `f32` export with a manifest
//! - [`histogram`]: cached weight-magnitude histograms and their plots

pub mod checkpoint;
pub mod convert;
pub mod error;
pub mod flatbin;
pub mod histogram;
pub mod preview;

#[cfg(test)]
mod test_support;

pub use checkpoint::{Checkpoint, ParamInfo};
pub use convert::{Manifest, ManifestEntry, convert_checkpoint};
pub use error::{Result, WeightscopeError};
pub use histogram::{CacheStatus, Histogram, HistogramSpec, PlotOutcome, plot_directory};
pub use preview::Preview;
