//! Parameter listing for a checkpoint

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use weightscope::{Checkpoint, ParamInfo};

use crate::config::CliConfig;
use crate::output::{OutputFormat, emit, group_digits, heading};

/// Inspect command arguments
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Checkpoint file, or a directory holding one
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Output format as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// What `inspect` reports, in either output format.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: String,
    pub params: Vec<ParamInfo>,
    pub total_elements: usize,
}

impl InspectCommand {
    pub fn execute(&self, _config: &CliConfig) -> Result<()> {
        let checkpoint = Checkpoint::open(&self.path)
            .with_context(|| format!("Failed to open checkpoint: {}", self.path.display()))?;
        info!(path = %checkpoint.path().display(), params = checkpoint.len(), "inspecting checkpoint");

        let report = InspectReport {
            path: checkpoint.path().display().to_string(),
            params: checkpoint.params().to_vec(),
            total_elements: checkpoint.total_elements(),
        };
        emit(OutputFormat::from_json_flag(self.json), &report, print_text)
    }
}

fn print_text(report: &InspectReport) {
    heading(&report.path);
    let name_width = report.params.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for param in &report.params {
        println!("{:<name_width$}  {:<5}  {}", param.name, param.dtype_name(), param.shape_string());
    }
    println!(
        "{} parameters, {} elements",
        report.params.len(),
        group_digits(report.total_elements as u64)
    );
}
