//! Configuration loading and parsing

use anyhow::{Context, Result};
use chain_analysis::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Chain catalog (JSON)
    pub chains: Option<PathBuf>,
    /// Event log
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write results here instead of stdout
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_analysis::ResponseTimeMode;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            chains = "chains.json"
            log = "trace.log"

            [analysis]
            mode = "per-event"
            parallel = true
            chain_filter = [0, 3]

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.chains, Some(PathBuf::from("chains.json")));
        assert_eq!(config.analysis.mode, ResponseTimeMode::PerEvent);
        assert!(config.analysis.parallel);
        assert_eq!(config.analysis.chain_filter, Some(vec![0, 3]));
        assert_eq!(config.analysis.max_line_len, chain_analysis::config::DEFAULT_MAX_LINE_LEN);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.file.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.log.is_none());
        assert_eq!(config.analysis.mode, ResponseTimeMode::PathMatching);
        assert_eq!(config.output.format, OutputFormat::Table);
    }
}
