//! weightscope CLI
//!
//! Inspect SafeTensors checkpoints, preview tensor blocks, export parameters as
//! flat f32 files and plot weight-value histograms.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use weightscope_cli::commands::{ConvertCommand, InspectCommand, PlotCommand, PreviewCommand};
use weightscope_cli::config::{CliConfig, load_configuration};
use weightscope_cli::exit::EXIT_FAILURE;

/// Checkpoint inspection toolkit
#[derive(Parser)]
#[command(name = "weightscope")]
#[command(about = "Inspect, preview, convert and plot neural-network checkpoint weights")]
#[command(version)]
struct Cli {
    /// Configuration file [default: ./weightscope.toml if present]
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List parameter names, dtypes and shapes
    Inspect(InspectCommand),
    /// Print the top-left block of one parameter
    Preview(PreviewCommand),
    /// Write every parameter to <out-dir>/<name>.bin as little-endian f32
    Convert(ConvertCommand),
    /// Histogram the values of matching .bin files
    Plot(PlotCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.as_deref(), cli.log_level.clone())?;
    setup_logging(&config);

    let result = match &cli.command {
        Commands::Inspect(cmd) => cmd.execute(&config),
        Commands::Preview(cmd) => cmd.execute(&config),
        Commands::Convert(cmd) => cmd.execute(&config),
        Commands::Plot(cmd) => cmd.execute(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);

        let mut source = e.source();
        while let Some(err) = source {
            error!("  Caused by: {}", err);
            source = err.source();
        }

        std::process::exit(EXIT_FAILURE);
    }

    Ok(())
}

/// Install the global subscriber. Logs go to stderr.
fn setup_logging(config: &CliConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format.as_str() {
        "json" => subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.compact().init(),
    }
}
