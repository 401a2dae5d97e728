//! Export every parameter to a flat f32 file

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use weightscope::{Checkpoint, convert_checkpoint};

use crate::config::CliConfig;
use crate::output::group_digits;

/// Convert command arguments
#[derive(Args, Debug)]
pub struct ConvertCommand {
    /// Checkpoint file, or a directory holding one
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Directory for the `.bin` files (created if missing)
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Print one line per written file
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertCommand {
    pub fn execute(&self, _config: &CliConfig) -> Result<()> {
        let checkpoint = Checkpoint::open(&self.path)
            .with_context(|| format!("Failed to open checkpoint: {}", self.path.display()))?;

        let manifest = convert_checkpoint(&checkpoint, &self.out_dir, |entry| {
            if self.verbose {
                println!(
                    "{} -> {} {:?}",
                    entry.name,
                    self.out_dir.join(&entry.file).display(),
                    entry.shape
                );
            }
        })
        .with_context(|| format!("Failed to convert into {}", self.out_dir.display()))?;

        println!(
            "Converted {} parameters ({} bytes) into {}",
            manifest.tensors.len(),
            group_digits(manifest.total_bytes()),
            self.out_dir.display()
        );
        Ok(())
    }
}
