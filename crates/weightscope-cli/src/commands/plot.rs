//! Weight-value histogram of a directory of flat files

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use weightscope::histogram::{render_ascii, validate_bins};
use weightscope::{HistogramSpec, plot_directory};

use crate::config::CliConfig;

const ASCII_ROWS: usize = 20;
const ASCII_WIDTH: usize = 50;

/// Plot command arguments
#[derive(Args, Debug)]
pub struct PlotCommand {
    /// Directory of `.bin` files written by `convert`
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Regular expression matched against file names [default: plot.pattern from config]
    #[arg(long, value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Number of bins, must be even [default: plot.n_bins from config]
    #[arg(long, value_name = "N", value_parser = parse_even_bins)]
    pub n_bins: Option<usize>,

    /// Magnitude bound for both the range and the kept values
    #[arg(long, value_name = "F", value_parser = parse_cutoff)]
    pub cutoff: Option<f32>,

    /// Also print a terminal bar chart
    #[arg(long)]
    pub ascii: bool,
}

fn parse_even_bins(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("invalid bin count '{s}': {e}"))?;
    validate_bins(n).map_err(|e| e.to_string())?;
    Ok(n)
}

fn parse_cutoff(s: &str) -> std::result::Result<f32, String> {
    let c: f32 = s.parse().map_err(|e| format!("invalid cutoff '{s}': {e}"))?;
    if !(c.is_finite() && c > 0.0) {
        return Err(format!("cutoff must be a positive finite number, got {s}"));
    }
    Ok(c)
}

impl PlotCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let pattern = self.pattern.clone().unwrap_or_else(|| config.plot.pattern.clone());
        let n_bins = self.n_bins.unwrap_or(config.plot.n_bins);
        let spec = HistogramSpec::new(pattern, n_bins, self.cutoff)?;

        let outcome = plot_directory(&self.path, &spec, &config.plot.histogram_dir)
            .with_context(|| format!("Failed to plot {}", self.path.display()))?;
        tracing::info!(status = ?outcome.status, cache = %outcome.cache_path.display(), "histogram ready");

        let shown = outcome.histogram.within(spec.cutoff);
        println!("plot: {}", outcome.svg_path.display());
        println!("bins: {}  values: {}", shown.len(), shown.total());
        if self.ascii {
            print!("{}", render_ascii(&shown, ASCII_ROWS, ASCII_WIDTH));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_must_be_even_and_positive() {
        assert_eq!(parse_even_bins("200"), Ok(200));
        assert!(parse_even_bins("201").is_err());
        assert!(parse_even_bins("0").is_err());
        assert!(parse_even_bins("-4").is_err());
        assert!(parse_even_bins("ten").is_err());
    }

    #[test]
    fn cutoff_must_be_positive() {
        assert_eq!(parse_cutoff("0.5"), Ok(0.5));
        assert!(parse_cutoff("0").is_err());
        assert!(parse_cutoff("-1").is_err());
        assert!(parse_cutoff("inf").is_err());
        assert!(parse_cutoff("NaN").is_err());
    }
}
