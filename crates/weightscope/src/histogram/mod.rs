//! Weight-value histograms over directories of flat parameter files.
//!
//! The range is symmetric around zero. Without a cutoff it spans the largest
//! absolute value found in any matched file; with a cutoff the cutoff is both
//! the range and the filter bound. `n_bins` must be even and bins are indexed
//! by `floor(v / width)` over `[-n_bins/2, n_bins/2)` with
//! `width = 2 * scale / (n_bins - 1)`, so both ends of the range land inside.
//!
//! Only the first half of each file's values is binned. This matches the
//! historical output of the tool and is kept on purpose until its origin is
//! understood.

mod cache;
mod render;

pub use cache::{CacheStatus, cache_file_name, load_cached, store_cached};
pub use render::{render_ascii, render_svg};

use crate::error::{Result, WeightscopeError};
use crate::flatbin::{self, read_f32_file};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default subdirectory (of the plotted directory) for caches and plots.
pub const DEFAULT_HISTOGRAM_DIR: &str = "histograms";

/// Inputs that fully determine a histogram, and hence its cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSpec {
    pub pattern: String,
    pub n_bins: usize,
    pub cutoff: Option<f32>,
}

impl HistogramSpec {
    pub fn new(pattern: impl Into<String>, n_bins: usize, cutoff: Option<f32>) -> Result<Self> {
        let spec = Self { pattern: pattern.into(), n_bins, cutoff };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        validate_bins(self.n_bins)?;
        if let Some(c) = self.cutoff
            && !(c.is_finite() && c > 0.0)
        {
            return Err(WeightscopeError::InvalidCutoff(c));
        }
        Ok(())
    }

    /// Compile the name pattern.
    pub fn regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.pattern)?)
    }
}

/// Reject zero or odd bin counts.
pub fn validate_bins(n_bins: usize) -> Result<()> {
    if n_bins == 0 || n_bins % 2 != 0 {
        return Err(WeightscopeError::OddBinCount(n_bins));
    }
    Ok(())
}

/// Bin centers and counts, the on-disk cache shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub x: Vec<f32>,
    pub y: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.y.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Drop points whose bin center lies beyond `cutoff` (render-time filter).
    pub fn within(&self, cutoff: Option<f32>) -> Histogram {
        let Some(cutoff) = cutoff else {
            return self.clone();
        };
        let (x, y) = self
            .x
            .iter()
            .zip(&self.y)
            .filter(|(x, _)| x.abs() <= cutoff)
            .map(|(x, y)| (*x, *y))
            .unzip();
        Histogram { x, y }
    }
}

/// Fixed-width accumulator for one histogram.
#[derive(Debug, Clone)]
pub struct Binner {
    width: f64,
    half: i64,
    cutoff: Option<f32>,
    counts: Vec<u64>,
}

impl Binner {
    /// `scale` is the symmetric range bound; it must be positive.
    pub fn new(scale: f32, n_bins: usize, cutoff: Option<f32>) -> Result<Self> {
        validate_bins(n_bins)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(WeightscopeError::DegenerateRange);
        }
        let width = 2.0 * scale as f64 / (n_bins as f64 - 1.0);
        Ok(Self { width, half: (n_bins / 2) as i64, cutoff, counts: vec![0; n_bins] })
    }

    pub fn bin_width(&self) -> f64 {
        self.width
    }

    /// Slot for `value`, or `None` when it is filtered or out of range.
    pub fn slot(&self, value: f32) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        if let Some(c) = self.cutoff
            && value.abs() > c
        {
            return None;
        }
        let idx = (value as f64 / self.width).floor() as i64;
        if idx < -self.half || idx >= self.half {
            return None;
        }
        Some((idx + self.half) as usize)
    }

    pub fn add(&mut self, values: &[f32]) {
        for &v in values {
            if let Some(slot) = self.slot(v) {
                self.counts[slot] += 1;
            }
        }
    }

    pub fn finish(self) -> Histogram {
        let x = (-self.half..self.half).map(|k| ((k as f64 + 0.5) * self.width) as f32).collect();
        Histogram { x, y: self.counts }
    }
}

/// Flat files directly inside `dir` whose names match `pattern`, sorted.
/// Symlinks are followed and judged by their target.
pub fn matching_files(dir: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            tracing::debug!(path = %entry.path().display(), "skipping non-file entry");
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some(flatbin::EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str())
            && pattern.is_match(name)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Largest finite absolute value across whole files.
pub fn max_abs(files: &[PathBuf]) -> Result<f32> {
    let mut max = 0.0f32;
    for path in files {
        let values = read_f32_file(path)?;
        let file_max =
            values.iter().filter(|v| v.is_finite()).fold(0.0f32, |m, v| m.max(v.abs()));
        tracing::debug!(file = %path.display(), max_abs = file_max, "scanned for range");
        max = max.max(file_max);
    }
    Ok(max)
}

/// The leading half of a file's values, the part that gets binned.
pub fn binned_half(values: &[f32]) -> &[f32] {
    &values[..values.len() / 2]
}

/// Scan `dir` and build the histogram described by `spec`.
pub fn compute(dir: &Path, spec: &HistogramSpec) -> Result<Histogram> {
    spec.validate()?;
    let pattern = spec.regex()?;
    let files = matching_files(dir, &pattern)?;
    if files.is_empty() {
        return Err(WeightscopeError::NoMatchingFiles {
            dir: dir.display().to_string(),
            pattern: spec.pattern.clone(),
        });
    }
    tracing::info!(files = files.len(), pattern = %spec.pattern, "building histogram");

    let scale = match spec.cutoff {
        Some(c) => c,
        None => max_abs(&files)?,
    };
    let mut binner = Binner::new(scale, spec.n_bins, spec.cutoff)?;
    tracing::debug!(scale, bin_width = binner.bin_width(), "histogram range");

    for path in &files {
        let values = read_f32_file(path)?;
        binner.add(binned_half(&values));
    }
    Ok(binner.finish())
}

/// Result of a plot run.
#[derive(Debug, Clone)]
pub struct PlotOutcome {
    /// Histogram as stored in (or loaded from) the cache, before render filtering.
    pub histogram: Histogram,
    pub status: CacheStatus,
    pub cache_path: PathBuf,
    pub svg_path: PathBuf,
}

/// Load or compute the histogram for `spec`, cache it, and write its SVG plot.
///
/// Cache and plot live in `dir/<histogram_dir>/`.
pub fn plot_directory(dir: &Path, spec: &HistogramSpec, histogram_dir: &str) -> Result<PlotOutcome> {
    spec.validate()?;
    let out_dir = dir.join(histogram_dir);
    let stem = cache_file_name(spec);
    let cache_path = out_dir.join(format!("{stem}.json"));

    let (histogram, status) = match load_cached(&cache_path)? {
        Some(hist) => {
            tracing::info!(cache = %cache_path.display(), "using cached histogram");
            (hist, CacheStatus::Hit)
        }
        None => {
            let hist = compute(dir, spec)?;
            store_cached(&cache_path, &hist)?;
            tracing::info!(cache = %cache_path.display(), total = hist.total(), "cached histogram");
            (hist, CacheStatus::Miss)
        }
    };

    let shown = histogram.within(spec.cutoff);
    let svg_path = out_dir.join(format!("{stem}.svg"));
    let title = format!("{} ({} bins)", spec.pattern, spec.n_bins);
    fs::create_dir_all(&out_dir)?;
    fs::write(&svg_path, render_svg(&shown, &title))?;

    Ok(PlotOutcome { histogram, status, cache_path, svg_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_flat;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn odd_and_zero_bins_rejected() {
        assert!(matches!(HistogramSpec::new("w", 7, None), Err(WeightscopeError::OddBinCount(7))));
        assert!(matches!(HistogramSpec::new("w", 0, None), Err(WeightscopeError::OddBinCount(0))));
        assert!(HistogramSpec::new("w", 8, None).is_ok());
    }

    #[test]
    fn bad_cutoff_rejected() {
        assert!(matches!(
            HistogramSpec::new("w", 4, Some(0.0)),
            Err(WeightscopeError::InvalidCutoff(_))
        ));
        assert!(HistogramSpec::new("w", 4, Some(f32::NAN)).is_err());
    }

    #[test]
    fn range_ends_land_in_outer_bins() {
        let binner = Binner::new(1.0, 4, None).unwrap();
        // width = 2/3: -1 -> floor(-1.5) = -2, 1 -> floor(1.5) = 1
        assert_eq!(binner.slot(-1.0), Some(0));
        assert_eq!(binner.slot(1.0), Some(3));
        assert_eq!(binner.slot(0.0), Some(2));
        assert_eq!(binner.slot(-0.1), Some(1));
        assert_eq!(binner.slot(f32::NAN), None);
        assert_eq!(binner.slot(1.4), None);
    }

    #[test]
    fn cutoff_filters_before_binning() {
        let mut binner = Binner::new(0.5, 4, Some(0.5)).unwrap();
        binner.add(&[0.6, -0.6, 0.5, -0.5, 0.1]);
        let hist = binner.finish();
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.y, vec![1, 0, 1, 1]);
    }

    #[test]
    fn bin_centers_are_symmetric() {
        let hist = Binner::new(3.0, 4, None).unwrap().finish();
        // width = 2
        assert_eq!(hist.x, vec![-3.0, -1.0, 1.0, 3.0]);
    }

    #[test]
    fn only_first_half_of_each_file_is_binned() {
        let dir = TempDir::new().unwrap();
        write_flat(&dir.path().join("a.weight.bin"), &[0.1, 0.2, 5.0, 5.0]);
        write_flat(&dir.path().join("b.weight.bin"), &[-0.3, 0.4, -5.0]);

        let spec = HistogramSpec::new("weight", 10, None).unwrap();
        let hist = compute(dir.path(), &spec).unwrap();
        // 2 values from a, 1 from b (3 / 2 == 1); range still spans the 5.0s.
        assert_eq!(hist.total(), 3);
        // width = 10 / 9, outermost center = 4.5 * width
        assert!((hist.x[9] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn pattern_and_extension_select_files() {
        let dir = TempDir::new().unwrap();
        write_flat(&dir.path().join("l0.weight.bin"), &[1.0, 1.0]);
        write_flat(&dir.path().join("l0.bias.bin"), &[1.0, 1.0]);
        std::fs::write(dir.path().join("weight.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub.weight.bin")).unwrap();

        let files = matching_files(dir.path(), &Regex::new("weight").unwrap()).unwrap();
        assert_eq!(files, vec![dir.path().join("l0.weight.bin")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_matched() {
        let dir = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let target = store.path().join("shared.bin");
        write_flat(&target, &[1.0, 1.0]);
        std::os::unix::fs::symlink(&target, dir.path().join("l1.weight.bin")).unwrap();
        write_flat(&dir.path().join("l0.weight.bin"), &[1.0, 1.0]);

        let files = matching_files(dir.path(), &Regex::new("weight").unwrap()).unwrap();
        assert_eq!(files, vec![dir.path().join("l0.weight.bin"), dir.path().join("l1.weight.bin")]);
    }

    #[test]
    fn no_match_and_malformed_pattern() {
        let dir = TempDir::new().unwrap();
        write_flat(&dir.path().join("w.bin"), &[1.0, 1.0]);

        let spec = HistogramSpec::new("nothing", 4, None).unwrap();
        assert!(matches!(compute(dir.path(), &spec), Err(WeightscopeError::NoMatchingFiles { .. })));

        let spec = HistogramSpec::new("(unclosed", 4, None).unwrap();
        assert!(matches!(compute(dir.path(), &spec), Err(WeightscopeError::Pattern(_))));
    }

    #[test]
    fn all_zero_weights_have_no_range() {
        let dir = TempDir::new().unwrap();
        write_flat(&dir.path().join("w.bin"), &[0.0; 8]);
        let spec = HistogramSpec::new("w", 4, None).unwrap();
        assert!(matches!(compute(dir.path(), &spec), Err(WeightscopeError::DegenerateRange)));
    }

    #[test]
    fn within_drops_points_beyond_cutoff() {
        let hist = Histogram { x: vec![-3.0, -1.0, 1.0, 3.0], y: vec![1, 2, 3, 4] };
        let shown = hist.within(Some(2.0));
        assert_eq!(shown.x, vec![-1.0, 1.0]);
        assert_eq!(shown.y, vec![2, 3]);
        assert_eq!(hist.within(None), hist);
    }

    #[test]
    fn plot_uses_cache_on_second_run() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("fc.weight.bin");
        write_flat(&file, &[0.5, -0.25, 1.0, -1.0, 0.0, 0.75]);
        let spec = HistogramSpec::new("weight", 6, None).unwrap();

        let first = plot_directory(dir.path(), &spec, DEFAULT_HISTOGRAM_DIR).unwrap();
        assert_eq!(first.status, CacheStatus::Miss);
        assert!(first.cache_path.exists());
        assert!(first.svg_path.exists());

        // Without the source files only the cache can answer.
        std::fs::remove_file(&file).unwrap();
        let second = plot_directory(dir.path(), &spec, DEFAULT_HISTOGRAM_DIR).unwrap();
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(second.histogram, first.histogram);
        assert_eq!(second.cache_path, first.cache_path);

        // A different key misses and has nothing to scan.
        let other = HistogramSpec::new("weight", 8, None).unwrap();
        assert!(plot_directory(dir.path(), &other, DEFAULT_HISTOGRAM_DIR).is_err());
    }

    proptest! {
        #[test]
        fn prop_counts_equal_filtered_values(
            values in prop::collection::vec(-10.0f32..10.0, 1..200),
            half_bins in 1usize..64,
            cutoff in prop::option::of(0.5f32..12.0),
        ) {
            let n_bins = half_bins * 2;
            let scale = match cutoff {
                Some(c) => c,
                None => values.iter().fold(0.0f32, |m, v| m.max(v.abs())),
            };
            prop_assume!(scale > 0.0);

            let mut binner = Binner::new(scale, n_bins, cutoff).unwrap();
            binner.add(&values);
            let hist = binner.finish();

            let expected = values
                .iter()
                .filter(|v| cutoff.is_none_or(|c| v.abs() <= c))
                .count() as u64;
            prop_assert_eq!(hist.total(), expected);
            prop_assert_eq!(hist.y.len(), n_bins);
            prop_assert_eq!(hist.x.len(), n_bins);
        }

        #[test]
        fn prop_slot_in_range(value in any::<f32>(), half_bins in 1usize..128) {
            let binner = Binner::new(1.0, half_bins * 2, None).unwrap();
            if let Some(slot) = binner.slot(value) {
                prop_assert!(slot < half_bins * 2);
            }
        }
    }
}
