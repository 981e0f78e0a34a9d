//! Incident aggregation and statistics.
//!
//! This module turns a flat list of incident records into the grouped
//! counts behind each chart: crime type, victim gender, victim age
//! bracket, area, and occurrence month.

use crate::models::{AgeBracket, IncidentRecord};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Default number of bars in the crime-type and area charts.
pub const DEFAULT_CHART_TOP_N: usize = 10;

/// Count of occurrences per category key.
///
/// Keys remember the order they were first seen in. That order is the
/// table's natural key order and breaks ties in [`FrequencyTable::top_n`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the given keys present at zero.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for key in keys {
            table.slot(key.into());
        }
        table
    }

    /// Adds one occurrence of `key`.
    pub fn increment(&mut self, key: &str) {
        let pos = match self.index.get(key) {
            Some(&pos) => pos,
            None => self.slot(key.to_string()),
        };
        self.entries[pos].1 += 1;
    }

    /// Count for `key`, zero if it was never seen.
    pub fn get(&self, key: &str) -> usize {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in natural key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// The `n` keys with the largest counts, highest first.
    ///
    /// Ties keep natural key order.
    pub fn top_n(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked = self.entries.clone();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Entries ordered by key, for chronological series like `YYYY-MM`.
    pub fn sorted_by_key(&self) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
    }

    fn slot(&mut self, key: String) -> usize {
        if let Some(&pos) = self.index.get(&key) {
            return pos;
        }
        let pos = self.entries.len();
        self.index.insert(key.clone(), pos);
        self.entries.push((key, 0));
        pos
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// All chart summaries for one batch of records.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CrimeSummary {
    /// Number of records aggregated.
    pub total_records: usize,
    pub crime_types: FrequencyTable,
    /// Raw victim sex codes, unlabelled.
    pub genders: FrequencyTable,
    /// Always holds all five brackets.
    pub age_brackets: FrequencyTable,
    pub areas: FrequencyTable,
    /// Keyed by `YYYY-MM`.
    pub months: FrequencyTable,
}

/// Aggregate records into per-dimension frequency tables.
///
/// A malformed field only removes its record from that one dimension.
pub fn aggregate(records: &[IncidentRecord]) -> CrimeSummary {
    let mut summary = CrimeSummary {
        total_records: records.len(),
        age_brackets: FrequencyTable::with_keys(AgeBracket::ALL.iter().map(|b| b.label())),
        ..CrimeSummary::default()
    };

    for record in records {
        if let Some(crime_type) = record.crime_type() {
            summary.crime_types.increment(crime_type);
        }

        if let Some(sex) = record.sex_code() {
            summary.genders.increment(sex);
        }

        if let Some(area) = record.area_name() {
            summary.areas.increment(area);
        }

        if let Some(age) = record.victim_age.as_deref().and_then(parse_age) {
            summary.age_brackets.increment(AgeBracket::classify(age).label());
        }

        if let Some(month) = record.occurred_date.as_deref().and_then(month_bucket) {
            summary.months.increment(&month);
        }
    }

    summary
}

/// Parse an age the way a lenient integer parser would.
///
/// Leading whitespace and one sign are allowed, then the leading run of
/// digits is taken and anything after it is ignored. Runs too long for
/// `i64` clamp to `i64::MAX` (or `i64::MIN` when negative).
pub fn parse_age(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }

    let value = rest[..digits_len].bytes().fold(0i64, |acc, b| {
        let digit = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    });
    Some(value)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse an occurrence date in any of the shapes the feed is known to use.
pub fn parse_occurred_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// Month bucket key (`YYYY-MM`) for an occurrence date.
pub fn month_bucket(raw: &str) -> Option<String> {
    parse_occurred_date(raw).map(|date| format!("{:04}-{:02}", date.year(), date.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(crime: &str, age: &str) -> IncidentRecord {
        IncidentRecord {
            crime_description: Some(crime.to_string()),
            victim_age: Some(age.to_string()),
            ..IncidentRecord::default()
        }
    }

    #[test]
    fn test_frequency_table_get_or_zero() {
        let mut table = FrequencyTable::new();
        assert_eq!(table.get("THEFT"), 0);
        assert!(table.is_empty());

        table.increment("THEFT");
        table.increment("THEFT");
        assert_eq!(table.get("THEFT"), 2);
        assert_eq!(table.total(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_with_keys_keeps_zero_entries() {
        let table = FrequencyTable::with_keys(["a", "b"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("b"), 0);
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn test_aggregate_example() {
        let records = vec![
            record("THEFT", "30"),
            record("THEFT", "70"),
            record("ASSAULT", "abc"),
        ];

        let summary = aggregate(&records);

        assert_eq!(summary.crime_types.get("THEFT"), 2);
        assert_eq!(summary.crime_types.get("ASSAULT"), 1);
        assert_eq!(summary.crime_types.len(), 2);

        assert_eq!(summary.age_brackets.get("26-40"), 1);
        assert_eq!(summary.age_brackets.get("Over 60"), 1);
        assert_eq!(summary.age_brackets.get("Under 18"), 0);
        assert_eq!(summary.age_brackets.get("18-25"), 0);
        assert_eq!(summary.age_brackets.get("41-60"), 0);
        assert_eq!(summary.age_brackets.total(), 2);
    }

    #[test]
    fn test_all_age_brackets_present_on_empty_input() {
        let summary = aggregate(&[]);

        assert_eq!(summary.total_records, 0);
        let keys: Vec<_> = summary.age_brackets.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Under 18", "18-25", "26-40", "41-60", "Over 60"]);
        assert_eq!(summary.age_brackets.total(), 0);
    }

    #[test]
    fn test_age_sum_matches_parseable_ages() {
        let ages = ["5", "-3", "18", "25 years", " 40", "+61", "3.7", "", "x1", "abc", "999"];
        let records: Vec<_> = ages.iter().map(|a| record("THEFT", a)).collect();

        let parseable = ages.iter().filter(|a| parse_age(a).is_some()).count();
        let summary = aggregate(&records);

        assert_eq!(parseable, 8);
        assert_eq!(summary.age_brackets.total(), parseable);
        assert_eq!(summary.age_brackets.get("Under 18"), 3);
        assert_eq!(summary.age_brackets.get("Over 60"), 2);
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age("30"), Some(30));
        assert_eq!(parse_age("  42"), Some(42));
        assert_eq!(parse_age("-7"), Some(-7));
        assert_eq!(parse_age("3.7"), Some(3));
        assert_eq!(parse_age("30abc"), Some(30));
        assert_eq!(parse_age("abc"), None);
        assert_eq!(parse_age("-"), None);
        assert_eq!(parse_age(""), None);
    }

    #[test]
    fn test_oversized_ages_saturate_into_brackets() {
        assert_eq!(parse_age("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_age("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(parse_age("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_age("-9223372036854775808"), Some(i64::MIN));

        let records = vec![
            record("THEFT", "99999999999999999999"),
            record("THEFT", "-99999999999999999999 yrs"),
        ];
        let summary = aggregate(&records);

        assert_eq!(summary.age_brackets.total(), 2);
        assert_eq!(summary.age_brackets.get("Over 60"), 1);
        assert_eq!(summary.age_brackets.get("Under 18"), 1);
    }

    #[test]
    fn test_missing_categories_are_excluded() {
        let records = vec![
            IncidentRecord {
                victim_sex: Some("M".to_string()),
                area: Some("Central".to_string()),
                ..IncidentRecord::default()
            },
            IncidentRecord {
                victim_sex: Some(String::new()),
                area: None,
                crime_description: Some(String::new()),
                ..IncidentRecord::default()
            },
        ];

        let summary = aggregate(&records);

        assert_eq!(summary.genders.total(), 1);
        assert_eq!(summary.genders.get("M"), 1);
        assert_eq!(summary.areas.total(), 1);
        assert!(summary.crime_types.is_empty());
    }

    #[test]
    fn test_month_bucket() {
        assert_eq!(month_bucket("2023-04-15"), Some("2023-04".to_string()));
        assert_eq!(month_bucket("2023-11-02T13:45:00.000"), Some("2023-11".to_string()));
        assert_eq!(month_bucket("2022-01-31T23:00:00Z"), Some("2022-01".to_string()));
        assert_eq!(month_bucket("03/01/2020 12:00:00 AM"), Some("2020-03".to_string()));
        assert_eq!(month_bucket("07/04/2021"), Some("2021-07".to_string()));
        assert_eq!(month_bucket(""), None);
        assert_eq!(month_bucket("not a date"), None);
        assert_eq!(month_bucket("2023-13-01"), None);
    }

    #[test]
    fn test_months_skip_unparseable_dates() {
        let records = vec![
            IncidentRecord {
                occurred_date: Some("2023-04-15".to_string()),
                ..IncidentRecord::default()
            },
            IncidentRecord {
                occurred_date: Some("2023-04-01".to_string()),
                ..IncidentRecord::default()
            },
            IncidentRecord {
                occurred_date: Some(String::new()),
                ..IncidentRecord::default()
            },
            IncidentRecord::default(),
        ];

        let summary = aggregate(&records);

        assert_eq!(summary.months.get("2023-04"), 2);
        assert_eq!(summary.months.total(), 2);
    }

    #[test]
    fn test_top_n_order_and_ties() {
        let mut table = FrequencyTable::new();
        for key in ["b", "a", "c", "a", "c", "d"] {
            table.increment(key);
        }

        let top = table.top_n(3);

        assert_eq!(
            top,
            vec![
                ("a".to_string(), 2),
                ("c".to_string(), 2),
                ("b".to_string(), 1)
            ]
        );
        assert_eq!(table.top_n(10).len(), 4);
        assert!(table.top_n(0).is_empty());
    }

    #[test]
    fn test_top_n_prefers_positive_counts() {
        let mut table = FrequencyTable::with_keys(["zero1", "zero2"]);
        table.increment("hit");

        let top = table.top_n(1);

        assert_eq!(top, vec![("hit".to_string(), 1)]);
    }

    #[test]
    fn test_sorted_by_key() {
        let mut table = FrequencyTable::new();
        for key in ["2023-05", "2022-12", "2023-01"] {
            table.increment(key);
        }

        let keys: Vec<_> = table.sorted_by_key().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["2022-12", "2023-01", "2023-05"]);
    }

    #[test]
    fn test_serialize_in_insertion_order() {
        let mut table = FrequencyTable::new();
        table.increment("z");
        table.increment("a");

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"z":1,"a":1}"#);
    }
}
