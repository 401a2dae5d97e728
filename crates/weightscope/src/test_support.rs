//! Fixture writers shared by the unit tests.

use safetensors::Dtype;
use safetensors::tensor::TensorView;
use std::fs;
use std::path::Path;

/// Write an all-`F32` SafeTensors file from `(name, shape, values)` triples.
pub(crate) fn write_checkpoint(path: &Path, tensors: &[(&str, Vec<usize>, Vec<f32>)]) {
    let payloads: Vec<Vec<u8>> = tensors
        .iter()
        .map(|(_, _, values)| values.iter().flat_map(|v| v.to_le_bytes()).collect())
        .collect();
    let views: Vec<(&str, TensorView<'_>)> = tensors
        .iter()
        .zip(&payloads)
        .map(|((name, shape, _), data)| {
            (*name, TensorView::new(Dtype::F32, shape.clone(), data).unwrap())
        })
        .collect();
    let bytes = safetensors::serialize(views.iter().map(|(k, v)| (*k, v)), None).unwrap();
    fs::write(path, bytes).unwrap();
}

/// Write a headerless little-endian `f32` file.
pub(crate) fn write_flat(path: &Path, values: &[f32]) {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(path, bytes).unwrap();
}
