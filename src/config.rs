//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.crimescope.toml` files.

use crate::analysis::{DEFAULT_CHART_TOP_N, DEFAULT_LEGEND_SIZE};
use crate::source::{SourceConfig as FetchConfig, DEFAULT_SOURCE_URL};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".crimescope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Map settings.
    #[serde(default)]
    pub map: MapConfig,
}

/// Record endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning the JSON record list.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds. Unset leaves it to the HTTP client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: None,
        }
    }
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

impl From<&SourceConfig> for FetchConfig {
    fn from(config: &SourceConfig) -> Self {
        Self {
            url: config.url.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Bars shown in the crime-type and area charts.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Rows shown in the incident table.
    #[serde(default = "default_max_table_rows")]
    pub max_table_rows: usize,

    /// Show `Male`/`Female`/`Non-Binary/Other` instead of raw codes.
    #[serde(default = "default_true")]
    pub label_genders: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            top_n: default_top_n(),
            max_table_rows: default_max_table_rows(),
            label_genders: true,
        }
    }
}

fn default_output() -> String {
    "crime_report.md".to_string()
}

fn default_top_n() -> usize {
    DEFAULT_CHART_TOP_N
}

fn default_max_table_rows() -> usize {
    50
}

fn default_true() -> bool {
    true
}

/// Map settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Build map points and legend at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Crime types that get their own legend color.
    #[serde(default = "default_legend_size")]
    pub legend_size: usize,

    /// Where to write the GeoJSON point layer, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geojson_output: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            legend_size: default_legend_size(),
            geojson_output: None,
        }
    }
}

fn default_legend_size() -> usize {
    DEFAULT_LEGEND_SIZE
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from `dir/.crimescope.toml`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Try to load configuration from the working directory.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values given explicitly on the command line override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.url {
            self.source.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = Some(timeout);
        }

        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(top) = args.top {
            self.report.top_n = top;
        }
        if let Some(rows) = args.max_rows {
            self.report.max_table_rows = rows;
        }
        if args.raw_genders {
            self.report.label_genders = false;
        }

        if args.no_map {
            self.map.enabled = false;
        }
        if let Some(size) = args.legend_size {
            self.map.legend_size = size;
        }
        if let Some(ref geojson) = args.geojson {
            self.map.geojson_output = Some(geojson.display().to_string());
        }
    }

    /// Check the merged settings, so values from the config file get the
    /// same limits as their command-line flags.
    pub fn validate(&self) -> Result<()> {
        let url = &self.source.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("source.url must start with 'http://' or 'https://': {}", url);
        }

        if self.source.timeout_seconds == Some(0) {
            bail!("source.timeout_seconds must be at least 1");
        }

        if self.report.top_n == 0 {
            bail!("report.top_n must be at least 1");
        }

        if self.map.legend_size == 0 {
            bail!("map.legend_size must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
