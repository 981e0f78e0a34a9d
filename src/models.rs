//! Data models for the crime dashboard.
//!
//! This module contains the core data structures used throughout
//! the application for representing incident records, age brackets,
//! and mappable points.

use crate::analysis::{CrimeSummary, GeoClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A single reported crime, as delivered by the record endpoint.
///
/// Every field is decoded leniently: strings are kept verbatim, numbers
/// and booleans are rendered to text, anything else becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Date the crime was reported.
    #[serde(rename = "date_rptd", default, deserialize_with = "lenient_string")]
    pub reported_date: Option<String>,
    /// Date the crime occurred.
    #[serde(rename = "date_occ", default, deserialize_with = "lenient_string")]
    pub occurred_date: Option<String>,
    /// Victim age, usually numeric but not guaranteed.
    #[serde(rename = "vict_age", default, deserialize_with = "lenient_string")]
    pub victim_age: Option<String>,
    /// Victim sex code (`M`, `F`, `X`, ...).
    #[serde(rename = "vict_sex", default, deserialize_with = "lenient_string")]
    pub victim_sex: Option<String>,
    /// Free-text crime description.
    #[serde(rename = "crm_cd_desc", default, deserialize_with = "lenient_string")]
    pub crime_description: Option<String>,
    /// Reporting area name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub area: Option<String>,
    /// Latitude as delivered.
    #[serde(rename = "lat", default, deserialize_with = "lenient_string")]
    pub latitude: Option<String>,
    /// Longitude as delivered.
    #[serde(rename = "lon", default, deserialize_with = "lenient_string")]
    pub longitude: Option<String>,
}

impl IncidentRecord {
    /// Crime description, if present and non-empty.
    pub fn crime_type(&self) -> Option<&str> {
        present(&self.crime_description)
    }

    /// Victim sex code, if present and non-empty.
    pub fn sex_code(&self) -> Option<&str> {
        present(&self.victim_sex)
    }

    /// Area name, if present and non-empty.
    pub fn area_name(&self) -> Option<&str> {
        present(&self.area)
    }
}

/// Returns the field as a `&str` when it holds a non-empty value.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// Victim age bracket used by the age chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "Under 18")]
    Under18,
    #[serde(rename = "18-25")]
    From18To25,
    #[serde(rename = "26-40")]
    From26To40,
    #[serde(rename = "41-60")]
    From41To60,
    #[serde(rename = "Over 60")]
    Over60,
}

impl AgeBracket {
    /// All brackets, youngest first.
    pub const ALL: [AgeBracket; 5] = [
        AgeBracket::Under18,
        AgeBracket::From18To25,
        AgeBracket::From26To40,
        AgeBracket::From41To60,
        AgeBracket::Over60,
    ];

    /// Classify an age into exactly one bracket.
    pub fn classify(age: i64) -> Self {
        match age {
            a if a < 18 => AgeBracket::Under18,
            18..=25 => AgeBracket::From18To25,
            26..=40 => AgeBracket::From26To40,
            41..=60 => AgeBracket::From41To60,
            _ => AgeBracket::Over60,
        }
    }

    /// Display label, also used as the frequency table key.
    pub fn label(&self) -> &'static str {
        match self {
            AgeBracket::Under18 => "Under 18",
            AgeBracket::From18To25 => "18-25",
            AgeBracket::From26To40 => "26-40",
            AgeBracket::From41To60 => "41-60",
            AgeBracket::Over60 => "Over 60",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An incident with usable coordinates, decorated for map display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victim_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victim_sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Hex display color assigned by crime-type rank.
    pub color: String,
}

/// One row of the map legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub crime_type: String,
    pub color: String,
    /// Number of mappable incidents of this type.
    pub count: usize,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Endpoint the records came from.
    pub source_url: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of records fetched.
    pub total_records: usize,
    /// Number of records with usable coordinates, if the map was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappable_records: Option<usize>,
    /// Time spent fetching and decoding, in seconds.
    pub fetch_seconds: f64,
    /// Wall time from startup to rendering, in seconds.
    pub duration_seconds: f64,
}

/// Everything handed to the renderers for one run.
#[derive(Debug, Clone)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: CrimeSummary,
    /// Map layer; `None` when the map is disabled.
    pub map: Option<GeoClassification>,
    /// Records for the incident table, in feed order.
    pub records: Vec<IncidentRecord>,
}
