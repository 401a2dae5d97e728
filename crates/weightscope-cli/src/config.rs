//! CLI configuration: built-in defaults, an optional TOML file, then flags.

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use weightscope::histogram::{DEFAULT_HISTOGRAM_DIR, validate_bins};
use weightscope::preview::DEFAULT_WINDOW;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "weightscope.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub logging: LoggingConfig,
    pub preview: PreviewConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error (any `EnvFilter` directive works)
    pub level: String,
    /// pretty, compact or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "compact".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub window: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { window: DEFAULT_WINDOW }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub pattern: String,
    pub n_bins: usize,
    pub histogram_dir: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            pattern: "weight".to_string(),
            n_bins: 200,
            histogram_dir: DEFAULT_HISTOGRAM_DIR.to_string(),
        }
    }
}

impl CliConfig {
    /// `weightscope.toml` in the working directory.
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.preview.window > 0, "preview.window must be at least 1");
        validate_bins(self.plot.n_bins).context("invalid plot.n_bins")?;
        ensure!(!self.plot.histogram_dir.is_empty(), "plot.histogram_dir must not be empty");
        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => Ok(()),
            other => bail!("unknown logging.format '{other}'. Expected one of: pretty, compact, json"),
        }
    }
}

/// Layers overrides on top of defaults or a config file.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: CliConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(Self { config })
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        if let Some(level) = level {
            self.config.logging.level = level;
        }
        self
    }

    pub fn build(self) -> Result<CliConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Resolve the configuration for one invocation.
///
/// An explicit `--config` must exist; the working-directory default is optional.
pub fn load_configuration(explicit: Option<&Path>, log_level: Option<String>) -> Result<CliConfig> {
    let builder = match explicit {
        Some(path) => ConfigBuilder::from_file(path)?,
        None => {
            let path = CliConfig::default_config_path();
            if path.exists() { ConfigBuilder::from_file(&path)? } else { ConfigBuilder::new() }
        }
    };
    builder.log_level(log_level).build().context("Failed to build configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.preview.window, 5);
        assert_eq!(config.plot.n_bins, 200);
        assert_eq!(config.plot.histogram_dir, "histograms");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[plot]\nn_bins = 64\npattern = \"proj\"").unwrap();

        let config = load_configuration(Some(file.path()), None).unwrap();
        assert_eq!(config.plot.n_bins, 64);
        assert_eq!(config.plot.pattern, "proj");
        assert_eq!(config.plot.histogram_dir, "histograms");
        assert_eq!(config.preview.window, 5);
    }

    #[test]
    fn flag_overrides_file_log_level() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"info\"").unwrap();

        let config = load_configuration(Some(file.path()), Some("debug".into())).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn odd_bins_in_file_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[plot]\nn_bins = 9").unwrap();
        assert!(load_configuration(Some(file.path()), None).is_err());
    }

    #[test]
    fn unknown_log_format_rejected() {
        let mut config = CliConfig::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_configuration(Some(Path::new("/nonexistent/weightscope.toml")), None);
        assert!(result.is_err());
    }
}
