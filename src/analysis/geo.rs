//! Map point classification.
//!
//! Picks out records with usable coordinates and colors each one by the
//! rank of its crime type among mappable incidents.

use crate::analysis::FrequencyTable;
use crate::models::{GeoPoint, IncidentRecord, LegendEntry};
use serde::Serialize;
use std::collections::HashMap;

/// Default number of crime types that get their own legend color.
pub const DEFAULT_LEGEND_SIZE: usize = 8;

/// Color for points whose crime type is not ranked.
pub const DEFAULT_COLOR: &str = "#9E9E9E";

/// Fixed colors for crime labels that show up in nearly every extract.
const CURATED_COLORS: &[(&str, &str)] = &[
    ("VEHICLE - STOLEN", "#E41A1C"),
    ("BATTERY - SIMPLE ASSAULT", "#377EB8"),
    ("BURGLARY FROM VEHICLE", "#4DAF4A"),
    ("THEFT OF IDENTITY", "#984EA3"),
    ("BURGLARY", "#FF7F00"),
    ("THEFT PLAIN - PETTY ($950 & UNDER)", "#A65628"),
    ("ASSAULT WITH DEADLY WEAPON, AGGRAVATED ASSAULT", "#F781BF"),
    ("INTIMATE PARTNER - SIMPLE ASSAULT", "#1B9E77"),
    ("VANDALISM - FELONY ($400 & OVER, ALL CHURCH VANDALISMS)", "#D95F02"),
    ("THEFT FROM MOTOR VEHICLE - PETTY ($950 & UNDER)", "#7570B3"),
    ("ROBBERY", "#E7298A"),
    ("THEFT-GRAND ($950.01 & OVER)EXCPT,GUNS,FOWL,LIVESTK,PROD", "#66A61E"),
    ("SHOPLIFTING - PETTY THEFT ($950 & UNDER)", "#E6AB02"),
    ("CRIMINAL THREATS - NO WEAPON DISPLAYED", "#A6761D"),
];

/// Colors handed out, in rank order, to types without a curated color.
const FALLBACK_PALETTE: &[&str] = &[
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8", "#82ca9d", "#ffc658", "#FF6B6B",
    "#6A0572", "#AB83A1",
];

/// Map points plus the legend that colors them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeoClassification {
    /// Ranked crime types with their colors, highest count first.
    pub legend: Vec<LegendEntry>,
    pub points: Vec<GeoPoint>,
}

impl GeoClassification {
    /// Color assigned to a crime type, or the default color if unranked.
    pub fn color_for(&self, crime_type: &str) -> &str {
        self.legend
            .iter()
            .find(|entry| entry.crime_type == crime_type)
            .map(|entry| entry.color.as_str())
            .unwrap_or(DEFAULT_COLOR)
    }
}

/// Parse a coordinate pair, rejecting non-finite values and the `(0, 0)`
/// no-location sentinel.
pub fn parse_coordinates(record: &IncidentRecord) -> Option<(f64, f64)> {
    let lat = parse_coordinate(record.latitude.as_deref()?)?;
    let lon = parse_coordinate(record.longitude.as_deref()?)?;

    if lat == 0.0 && lon == 0.0 {
        return None;
    }

    Some((lat, lon))
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Look up the curated color for a crime label. Labels match exactly,
/// the same way the frequency table keys them.
fn curated_color(crime_type: &str) -> Option<&'static str> {
    CURATED_COLORS
        .iter()
        .find(|(label, _)| *label == crime_type)
        .map(|(_, color)| *color)
}

/// Assign a distinct color to each ranked crime type.
///
/// Curated labels keep their fixed color. Others take the next fallback
/// color not yet in use, cycling by rank once the palette runs dry.
pub fn assign_colors(ranked: &[(String, usize)]) -> Vec<LegendEntry> {
    let curated: Vec<Option<&'static str>> =
        ranked.iter().map(|(label, _)| curated_color(label)).collect();

    let mut used: Vec<String> = curated
        .iter()
        .flatten()
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let mut fallback = FALLBACK_PALETTE.iter();

    ranked
        .iter()
        .zip(curated)
        .enumerate()
        .map(|(rank, ((crime_type, count), curated))| {
            let color = match curated {
                Some(color) => color,
                None => {
                    let next = fallback
                        .by_ref()
                        .find(|c| !used.contains(&c.to_ascii_lowercase()))
                        .copied();
                    match next {
                        Some(color) => {
                            used.push(color.to_ascii_lowercase());
                            color
                        }
                        None => FALLBACK_PALETTE[rank % FALLBACK_PALETTE.len()],
                    }
                }
            };

            LegendEntry {
                crime_type: crime_type.clone(),
                color: color.to_string(),
                count: *count,
            }
        })
        .collect()
}

/// Classify records into colored map points.
///
/// Every record with usable coordinates becomes a point; only the top
/// `legend_size` crime types get their own color.
pub fn classify(records: &[IncidentRecord], legend_size: usize) -> GeoClassification {
    let located: Vec<(&IncidentRecord, (f64, f64))> = records
        .iter()
        .filter_map(|record| parse_coordinates(record).map(|coords| (record, coords)))
        .collect();

    let mut crime_types = FrequencyTable::new();
    for (record, _) in &located {
        if let Some(crime_type) = record.crime_type() {
            crime_types.increment(crime_type);
        }
    }

    let legend = assign_colors(&crime_types.top_n(legend_size));
    let colors: HashMap<&str, &str> = legend
        .iter()
        .map(|entry| (entry.crime_type.as_str(), entry.color.as_str()))
        .collect();

    let points = located
        .into_iter()
        .map(|(record, (latitude, longitude))| {
            let color = record
                .crime_type()
                .and_then(|crime_type| colors.get(crime_type).copied())
                .unwrap_or(DEFAULT_COLOR);

            GeoPoint {
                latitude,
                longitude,
                crime_type: record.crime_type().map(String::from),
                occurred_date: record.occurred_date.clone(),
                victim_age: record.victim_age.clone(),
                victim_sex: record.victim_sex.clone(),
                area: record.area.clone(),
                color: color.to_string(),
            }
        })
        .collect();

    GeoClassification { legend, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn located(crime: &str, lat: &str, lon: &str) -> IncidentRecord {
        IncidentRecord {
            crime_description: Some(crime.to_string()),
            latitude: Some(lat.to_string()),
            longitude: Some(lon.to_string()),
            ..IncidentRecord::default()
        }
    }

    #[test]
    fn test_sentinel_coordinates_excluded() {
        let records = vec![
            located("THEFT", "0", "0"),
            located("THEFT", "0.0", "-0.0"),
            located("THEFT", "34.05", "-118.24"),
        ];

        let geo = classify(&records, DEFAULT_LEGEND_SIZE);

        assert_eq!(geo.points.len(), 1);
        assert_eq!(geo.points[0].latitude, 34.05);
        assert_eq!(geo.points[0].longitude, -118.24);
    }

    #[test]
    fn test_unusable_coordinates_excluded() {
        let records = vec![
            located("THEFT", "abc", "-118.24"),
            located("THEFT", "NaN", "-118.24"),
            located("THEFT", "inf", "-118.24"),
            located("THEFT", "", ""),
            IncidentRecord {
                crime_description: Some("THEFT".to_string()),
                latitude: Some("34.05".to_string()),
                ..IncidentRecord::default()
            },
            located("THEFT", " 34.1 ", "0"),
        ];

        let geo = classify(&records, DEFAULT_LEGEND_SIZE);

        assert_eq!(geo.points.len(), 1);
        assert_eq!(geo.points[0].latitude, 34.1);
    }

    #[test]
    fn test_legend_ranks_only_located_records() {
        let mut records = vec![
            located("ROBBERY", "34.0", "-118.0"),
            located("ARSON", "34.0", "-118.0"),
            located("ARSON", "34.0", "-118.0"),
        ];
        // Many thefts, none mappable.
        for _ in 0..5 {
            records.push(located("THEFT", "0", "0"));
        }

        let geo = classify(&records, DEFAULT_LEGEND_SIZE);

        let ranked: Vec<_> = geo.legend.iter().map(|e| e.crime_type.as_str()).collect();
        assert_eq!(ranked, vec!["ARSON", "ROBBERY"]);
        assert_eq!(geo.legend[0].count, 2);
    }

    #[test]
    fn test_colors_distinct_and_points_colored() {
        let mut records = Vec::new();
        for i in 0..12 {
            for _ in 0..(12 - i) {
                records.push(located(&format!("TYPE {}", i), "34.0", "-118.0"));
            }
        }
        records.push(located("VEHICLE - STOLEN", "34.0", "-118.0"));
        records.push(IncidentRecord {
            latitude: Some("34.0".to_string()),
            longitude: Some("-118.0".to_string()),
            ..IncidentRecord::default()
        });

        let geo = classify(&records, DEFAULT_LEGEND_SIZE);

        assert_eq!(geo.legend.len(), 8);
        let colors: HashSet<_> = geo.legend.iter().map(|e| e.color.to_lowercase()).collect();
        assert_eq!(colors.len(), 8);
        assert!(!colors.contains(&DEFAULT_COLOR.to_lowercase()));

        assert_eq!(geo.points.len(), records.len());
        assert!(geo.points.iter().all(|p| !p.color.is_empty()));

        let unranked = geo
            .points
            .iter()
            .find(|p| p.crime_type.as_deref() == Some("TYPE 11"))
            .unwrap();
        assert_eq!(unranked.color, DEFAULT_COLOR);
        assert!(geo.points.iter().any(|p| p.crime_type.is_none() && p.color == DEFAULT_COLOR));
    }

    #[test]
    fn test_curated_colors_win() {
        let ranked = vec![
            ("CUSTOM A".to_string(), 5),
            ("BURGLARY".to_string(), 4),
            ("CUSTOM B".to_string(), 3),
        ];

        let legend = assign_colors(&ranked);

        assert_eq!(legend[0].color, "#0088FE");
        assert_eq!(legend[1].color, "#FF7F00");
        assert_eq!(legend[2].color, "#00C49F");
    }

    #[test]
    fn test_case_variant_labels_get_distinct_colors() {
        let records = vec![
            located("BURGLARY", "34.0", "-118.0"),
            located("BURGLARY", "34.0", "-118.0"),
            located("Burglary", "34.0", "-118.0"),
        ];

        let geo = classify(&records, DEFAULT_LEGEND_SIZE);

        assert_eq!(geo.legend.len(), 2);
        assert_eq!(geo.color_for("BURGLARY"), "#FF7F00");
        assert_eq!(geo.color_for("Burglary"), "#0088FE");
        let colors: HashSet<_> = geo.legend.iter().map(|e| e.color.to_lowercase()).collect();
        assert_eq!(colors.len(), geo.legend.len());
    }

    #[test]
    fn test_fallback_cycles_by_rank_when_exhausted() {
        let ranked: Vec<_> = (0..12).map(|i| (format!("T{}", i), 12 - i)).collect();

        let legend = assign_colors(&ranked);

        assert_eq!(legend[9].color, FALLBACK_PALETTE[9]);
        assert_eq!(legend[10].color, FALLBACK_PALETTE[0]);
        assert_eq!(legend[11].color, FALLBACK_PALETTE[1]);
    }

    #[test]
    fn test_palettes_do_not_overlap() {
        let curated: HashSet<_> = CURATED_COLORS.iter().map(|(_, c)| c.to_lowercase()).collect();
        let fallback: HashSet<_> = FALLBACK_PALETTE.iter().map(|c| c.to_lowercase()).collect();

        assert_eq!(curated.len(), CURATED_COLORS.len());
        assert!(curated.is_disjoint(&fallback));
        assert!(!curated.contains(&DEFAULT_COLOR.to_lowercase()));
        assert!(!fallback.contains(&DEFAULT_COLOR.to_lowercase()));
    }

    #[test]
    fn test_color_for() {
        let records = vec![located("ROBBERY", "34.0", "-118.0")];
        let geo = classify(&records, DEFAULT_LEGEND_SIZE);

        assert_eq!(geo.color_for("ROBBERY"), "#E7298A");
        assert_eq!(geo.color_for("UNKNOWN"), DEFAULT_COLOR);
    }
}
