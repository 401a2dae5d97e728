//! Top-left block of one parameter

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use weightscope::{Checkpoint, Preview};

use crate::config::CliConfig;

/// Preview command arguments
#[derive(Args, Debug)]
pub struct PreviewCommand {
    /// Checkpoint file, or a directory holding one
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Parameter name, as listed by `inspect`
    #[arg(long, value_name = "NAME")]
    pub param: String,

    /// Rows/columns to show [default: preview.window from config, 5]
    #[arg(short = 'n', long = "window", value_name = "N")]
    pub window: Option<usize>,
}

impl PreviewCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let window = self.window.unwrap_or(config.preview.window);
        let checkpoint = Checkpoint::open(&self.path)
            .with_context(|| format!("Failed to open checkpoint: {}", self.path.display()))?;
        let preview = Preview::load(&checkpoint, &self.param, window)
            .with_context(|| format!("Failed to preview '{}'", self.param))?;
        println!("{preview}");
        Ok(())
    }
}
