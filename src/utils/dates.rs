//! Tolerant ISO-8601 parsing for registry release timestamps.
//!
//! Upstream registries are inconsistent about fractional seconds and
//! timezone suffixes; this tries a handful of formats before giving up,
//! mirroring the original's `ISO_FORMATS` list. A trailing `Z` is normalized
//! to `+00:00` first. All results are converted to UTC.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a date-or-datetime string into a UTC instant, tolerating a handful
/// of formats real registries emit. Returns `None` if nothing matches.
pub fn parse_flexible(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if let Some(stripped) = trimmed.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        trimmed.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    }

    None
}

/// Parse a millisecond epoch timestamp (as used by Maven's Solr search).
pub fn parse_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_z_as_utc() {
        let parsed = parse_flexible("2023-05-01T12:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2023-05-01T12:00:00+00:00");
    }

    #[test]
    fn parses_fractional_seconds() {
        let parsed = parse_flexible("2023-05-01T12:00:00.123456Z").unwrap();
        assert_eq!(parsed.timestamp(), 1682942400);
    }

    #[test]
    fn parses_date_only() {
        let parsed = parse_flexible("2023-05-01").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2023-05-01");
    }

    #[test]
    fn rejects_empty_string() {
        assert!(parse_flexible("").is_none());
    }

    #[test]
    fn parses_millis_epoch() {
        let parsed = parse_millis(1682942400000).unwrap();
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2023-05-01");
    }
}
