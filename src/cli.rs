//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// crimescope - crime incident dashboard generator
///
/// Fetch crime-incident records from a JSON endpoint and render
/// top crime types, victim demographics, area and monthly trends,
/// plus a colored map layer.
///
/// Examples:
///   crimescope
///   crimescope --url http://localhost:8080/all-crimes --format json -o report.json
///   crimescope --geojson incidents.geojson --legend-size 6
///   crimescope --no-map --raw-genders
///   crimescope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Endpoint returning the incident records as a JSON array
    ///
    /// Can also be set via CRIMESCOPE_URL or .crimescope.toml.
    #[arg(short, long, value_name = "URL", env = "CRIMESCOPE_URL")]
    pub url: Option<String>,

    /// Output file path for the report
    ///
    /// Defaults to crime_report.md (or the config file's report.output).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .crimescope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of bars in the crime-type and area charts
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Number of crime types that get their own map color
    #[arg(long, value_name = "N")]
    pub legend_size: Option<usize>,

    /// Maximum rows in the incident table
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// Skip map point classification and the legend
    #[arg(long, conflicts_with = "geojson")]
    pub no_map: bool,

    /// Keep raw victim sex codes instead of readable labels
    #[arg(long)]
    pub raw_genders: bool,

    /// Also write map points as a GeoJSON FeatureCollection
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,

    /// Dry run: fetch and summarize records without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .crimescope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON chart series
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.legend_size == Some(0) {
            return Err("--legend-size must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
