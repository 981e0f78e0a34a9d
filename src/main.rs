//! crimescope - Crime Incident Dashboard Generator
//!
//! A CLI tool that fetches crime-incident records from a JSON endpoint,
//! aggregates them into chart tables, classifies mappable incidents,
//! and writes a Markdown or JSON dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (fetch, config, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AgeBracket, IncidentRecord, Report, ReportMetadata};
use report::ReportOptions;
use source::RecordSource;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("crimescope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .crimescope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the endpoint, chart sizes, and map output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete fetch, aggregate, and render workflow.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    // Step 1: Fetch the records
    let source = RecordSource::new((&config.source).into())?;
    if !args.quiet {
        println!("📥 Fetching incident records: {}", source.url());
    }

    let fetch_start = Instant::now();
    let records = fetch_with_spinner(&source, !args.quiet).await?;
    let fetch_seconds = fetch_start.elapsed().as_secs_f64();

    // Step 2: Aggregate
    let summary = analysis::aggregate(&records);
    debug!(
        "Aggregated {} crime types, {} areas, {} months",
        summary.crime_types.len(),
        summary.areas.len(),
        summary.months.len()
    );

    // Step 3: Classify map points
    let map = if config.map.enabled {
        let geo = analysis::classify(&records, config.map.legend_size);
        info!(
            "Classified {} of {} records as map points",
            geo.points.len(),
            records.len()
        );
        Some(geo)
    } else {
        debug!("Map disabled, skipping geo classification");
        None
    };

    if args.dry_run {
        print_dry_run(&records, &summary, map.as_ref());
        return Ok(());
    }

    // Step 4: Render and write
    let report = Report {
        metadata: ReportMetadata {
            source_url: source.url().to_string(),
            generated_at: Utc::now(),
            total_records: records.len(),
            mappable_records: map.as_ref().map(|m| m.points.len()),
            fetch_seconds,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        summary,
        map,
        records,
    };

    let options = ReportOptions::from(&config.report);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report, &options)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &options),
    };

    let output_path = PathBuf::from(&config.report.output);
    report::write_report(&output, &output_path)?;

    if let (Some(map), Some(geojson_path)) = (&report.map, &config.map.geojson_output) {
        report::write_geojson(map, Path::new(geojson_path))?;
        info!("Wrote {} map points to {}", map.points.len(), geojson_path);
    }

    if !args.quiet {
        print_summary(&report);
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(())
}

/// Fetch records, showing a spinner while the request is in flight.
async fn fetch_with_spinner(source: &RecordSource, show: bool) -> Result<Vec<IncidentRecord>> {
    let spinner = show.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("spinner template is valid"),
        );
        pb.set_message("Loading...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = source.fetch_records().await;

    if let Some(pb) = spinner {
        match &result {
            Ok(records) => pb.finish_with_message(format!("Loaded {} records", records.len())),
            Err(_) => pb.abandon_with_message("Error loading data"),
        }
    }

    result.context("Error loading data")
}

/// Print the run summary to stdout.
fn print_summary(report: &Report) {
    let summary = &report.summary;

    println!("\n📊 Dashboard Summary:");
    println!("   Records: {}", report.metadata.total_records);
    println!("   Crime types: {}", summary.crime_types.len());
    println!("   Areas: {}", summary.areas.len());
    println!("   Victims with known age: {}", summary.age_brackets.total());
    if summary.months.is_empty() {
        println!("   Months covered: none (no parseable dates)");
    } else {
        println!("   Months covered: {}", summary.months.len());
    }
    if let Some(mappable) = report.metadata.mappable_records {
        println!("   Mappable incidents: {}", mappable);
    }
    if let Some((top, count)) = summary.crime_types.top_n(1).into_iter().next() {
        println!("   Most common: {} ({})", top, count);
    }
    println!(
        "   Duration: {:.1}s (fetch {:.1}s)",
        report.metadata.duration_seconds, report.metadata.fetch_seconds
    );
}

/// Handle --dry-run: print what would be reported, write nothing.
fn print_dry_run(
    records: &[IncidentRecord],
    summary: &analysis::CrimeSummary,
    map: Option<&analysis::GeoClassification>,
) {
    println!("\n🔍 Dry run: {} records fetched\n", records.len());

    println!("   Top crime types:");
    for (crime_type, count) in summary.crime_types.top_n(5) {
        println!("     {:>6}  {}", count, crime_type);
    }

    println!("\n   Age groups:");
    for bracket in AgeBracket::ALL {
        println!(
            "     {:>6}  {}",
            summary.age_brackets.get(bracket.label()),
            bracket
        );
    }

    if let Some(map) = map {
        println!("\n   Map legend ({} points):", map.points.len());
        for entry in &map.legend {
            println!("     {}  {} ({})", entry.color, entry.crime_type, entry.count);
        }
    }

    println!("\n✅ Dry run complete. No files were written.");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
