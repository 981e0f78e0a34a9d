//! Report generation.
//!
//! This module renders the aggregated summaries as a Markdown dashboard
//! or as JSON chart series.

use crate::analysis::geo::DEFAULT_COLOR;
use crate::analysis::{CrimeSummary, FrequencyTable, GeoClassification};
use crate::config::ReportConfig;
use crate::models::{present, IncidentRecord, Report, ReportMetadata};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::path::Path;

const BAR_WIDTH: usize = 20;

/// Rendering knobs for a report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Bars in the crime-type and area charts.
    pub top_n: usize,
    /// Rows in the incident table.
    pub max_table_rows: usize,
    /// Replace victim sex codes with readable labels.
    pub label_genders: bool,
}

impl From<&ReportConfig> for ReportOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            top_n: config.top_n,
            max_table_rows: config.max_table_rows,
            label_genders: config.label_genders,
        }
    }
}

/// Readable label for a victim sex code. Unknown codes pass through.
pub fn gender_label(code: &str) -> &str {
    match code {
        "M" => "Male",
        "F" => "Female",
        "X" => "Non-Binary/Other",
        other => other,
    }
}

/// Labels and values for one chart, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

impl ChartSeries {
    fn from_pairs(pairs: Vec<(String, usize)>) -> Self {
        let (labels, values) = pairs.into_iter().unzip();
        Self { labels, values }
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// The five chart series derived from a summary.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub crime_types: ChartSeries,
    pub genders: ChartSeries,
    pub age_groups: ChartSeries,
    pub areas: ChartSeries,
    pub monthly_trend: ChartSeries,
}

/// Build chart series from a summary, applying top-N limits and labels.
pub fn build_charts(summary: &CrimeSummary, options: &ReportOptions) -> ChartSet {
    let genders = summary
        .genders
        .iter()
        .map(|(code, count)| {
            let label = if options.label_genders {
                gender_label(code)
            } else {
                code
            };
            (label.to_string(), count)
        })
        .collect();

    ChartSet {
        crime_types: ChartSeries::from_pairs(summary.crime_types.top_n(options.top_n)),
        genders: ChartSeries::from_pairs(genders),
        age_groups: ChartSeries::from_pairs(in_order(&summary.age_brackets)),
        areas: ChartSeries::from_pairs(summary.areas.top_n(options.top_n)),
        monthly_trend: ChartSeries::from_pairs(summary.months.sorted_by_key()),
    }
}

fn in_order(table: &FrequencyTable) -> Vec<(String, usize)> {
    table
        .iter()
        .map(|(key, count)| (key.to_string(), count))
        .collect()
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportOptions) -> String {
    let charts = build_charts(&report.summary, options);
    let mut output = String::new();

    output.push_str("# Crime Dashboard Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    output.push_str(&generate_chart_section(
        "Top Crime Types",
        "Crime Type",
        &charts.crime_types,
    ));
    output.push_str(&generate_chart_section(
        "Victim Gender",
        "Gender",
        &charts.genders,
    ));
    output.push_str(&generate_chart_section(
        "Victim Age Groups",
        "Age Group",
        &charts.age_groups,
    ));
    output.push_str(&generate_chart_section(
        "Crimes by Area",
        "Area",
        &charts.areas,
    ));
    output.push_str(&generate_chart_section(
        "Crime Trends by Month",
        "Month",
        &charts.monthly_trend,
    ));

    if let Some(ref map) = report.map {
        output.push_str(&generate_legend_section(map));
    }

    output.push_str(&generate_incidents_section(
        &report.records,
        options.max_table_rows,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.total_records));
    if let Some(mappable) = metadata.mappable_records {
        section.push_str(&format!("- **Mappable Records:** {}\n", mappable));
    }
    section.push_str(&format!(
        "- **Fetch Duration:** {:.1}s\n",
        metadata.fetch_seconds
    ));
    section.push_str(&format!(
        "- **Total Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Top Crime Types](#top-crime-types)\n");
    toc.push_str("- [Victim Gender](#victim-gender)\n");
    toc.push_str("- [Victim Age Groups](#victim-age-groups)\n");
    toc.push_str("- [Crimes by Area](#crimes-by-area)\n");
    toc.push_str("- [Crime Trends by Month](#crime-trends-by-month)\n");
    if report.map.is_some() {
        toc.push_str("- [Map Legend](#map-legend)\n");
    }
    toc.push_str("- [Incidents](#incidents)\n");
    toc.push('\n');

    toc
}

/// Generate one chart as a Markdown table with proportional bars.
fn generate_chart_section(title: &str, column: &str, series: &ChartSeries) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));

    if series.labels.is_empty() {
        section.push_str("*No data.*\n\n");
        return section;
    }

    let max = series.values.iter().copied().max().unwrap_or(0);

    section.push_str(&format!("| {} | Incidents | |\n", column));
    section.push_str("|:---|---:|:---|\n");
    for (label, count) in series.pairs() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(label),
            count,
            bar(count, max)
        ));
    }
    section.push('\n');

    section
}

/// Generate the map legend section.
fn generate_legend_section(map: &GeoClassification) -> String {
    let mut section = String::new();

    section.push_str("## Map Legend\n\n");
    section.push_str(&format!(
        "*{} incidents with usable coordinates.*\n\n",
        map.points.len()
    ));

    if map.points.is_empty() {
        return section;
    }

    section.push_str("| Color | Crime Type | Incidents |\n");
    section.push_str("|:---:|:---|---:|\n");
    for entry in &map.legend {
        section.push_str(&format!(
            "| `{}` | {} | {} |\n",
            entry.color,
            escape_cell(&entry.crime_type),
            entry.count
        ));
    }

    let other = map
        .points
        .iter()
        .filter(|point| match point.crime_type.as_deref() {
            Some(crime_type) => map.color_for(crime_type) == DEFAULT_COLOR,
            None => true,
        })
        .count();
    if other > 0 {
        section.push_str(&format!("| `{}` | Other | {} |\n", DEFAULT_COLOR, other));
    }
    section.push('\n');

    section
}

/// Generate the incident table.
fn generate_incidents_section(records: &[IncidentRecord], max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Incidents\n\n");

    if records.is_empty() {
        section.push_str("*No incidents returned.*\n\n");
        return section;
    }

    let shown = records.len().min(max_rows);
    section.push_str(&format!(
        "*Showing {} of {} incidents.*\n\n",
        shown,
        records.len()
    ));
    section.push_str(
        "| Date Reported | Date Occurred | Victim Age | Victim Sex | Crime | Area | Lat | Lon |\n",
    );
    section.push_str("|:---|:---|---:|:---:|:---|:---|---:|---:|\n");

    for record in records.iter().take(shown) {
        let cells = [
            &record.reported_date,
            &record.occurred_date,
            &record.victim_age,
            &record.victim_sex,
            &record.crime_description,
            &record.area,
            &record.latitude,
            &record.longitude,
        ];
        let row: Vec<String> = cells
            .iter()
            .map(|field| escape_cell(present(field).unwrap_or("")))
            .collect();
        section.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by crimescope*\n".to_string()
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (count * BAR_WIDTH).div_ceil(max);
    "█".repeat(filled)
}

/// Generate a JSON report with chart series, full tables and the legend.
pub fn generate_json_report(report: &Report, options: &ReportOptions) -> Result<String> {
    let charts = build_charts(&report.summary, options);

    let map = report.map.as_ref().map(|map| {
        json!({
            "legend": map.legend,
            "default_color": DEFAULT_COLOR,
            "point_count": map.points.len(),
        })
    });

    let value = json!({
        "metadata": report.metadata,
        "charts": charts,
        "tables": report.summary,
        "map": map,
    });

    serde_json::to_string_pretty(&value).context("Failed to serialize JSON report")
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
