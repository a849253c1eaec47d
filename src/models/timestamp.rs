// file: src/models/timestamp.rs
// description: timestamp parsing and formatting shared by sources, sinks and the api
// reference: https://docs.rs/chrono

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Format used for timestamps in the inventory table.
pub const TABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder written for absent timestamps.
pub const MISSING: &str = "N/A";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses RFC 3339 or naive timestamps (naive values are taken as UTC).
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(MISSING) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn format_table(value: &DateTime<Utc>) -> String {
    value.format(TABLE_FORMAT).to_string()
}

pub fn format_optional(value: Option<&DateTime<Utc>>) -> String {
    value.map(format_table).unwrap_or_else(|| MISSING.to_string())
}

/// Stable textual form used as fingerprint material.
pub fn canonical(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
